use std::fmt::{self, Debug, Formatter};

use crate::Image;

/// A completion request to be sent to the model provider.
///
/// Each request is self-contained: it names the model to use and carries
/// the credential, so providers don't need to hold any per-model state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The name of the model, e.g. `gemini-pro`.
    pub model: String,
    /// The credential to authenticate the request with.
    pub credential: Credential,
    /// The user prompt.
    pub prompt: String,
    /// Images attached to the prompt.
    ///
    /// Callers should leave this empty for models that only accept text.
    pub images: Vec<Image>,
}

impl ModelRequest {
    /// Creates a text-only request.
    #[inline]
    pub fn text<M: Into<String>, P: Into<String>>(
        model: M,
        credential: Credential,
        prompt: P,
    ) -> Self {
        Self {
            model: model.into(),
            credential,
            prompt: prompt.into(),
            images: vec![],
        }
    }
}

/// An opaque API key.
///
/// The key is only held in memory, and it never shows up in `Debug`
/// output or logs.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Creates a credential from an API key.
    #[inline]
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// Returns the raw key.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no key has been set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}
