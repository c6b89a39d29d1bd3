use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use mime::Mime;

/// An encoded image attached to a prompt.
///
/// The bytes are kept in their original encoding (PNG, JPEG, etc.), and
/// `mime_type` tells the provider how to interpret them. Cloning is cheap
/// since the buffer is shared.
///
/// Two images are equal when both their bytes and their MIME types are
/// equal, so removing an image from a list works by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Image {
    data: Arc<[u8]>,
    mime_type: Mime,
}

impl Image {
    /// Creates an image from encoded bytes.
    #[inline]
    pub fn new<D: Into<Arc<[u8]>>>(data: D, mime_type: Mime) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    /// Returns the encoded bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the MIME type of the encoded bytes.
    #[inline]
    pub fn mime_type(&self) -> &Mime {
        &self.mime_type
    }
}

impl Debug for Image {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("mime_type", &self.mime_type.essence_str())
            .field("len", &self.data.len())
            .finish()
    }
}
