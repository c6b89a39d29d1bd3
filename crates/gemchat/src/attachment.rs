//! Loading image files for the draft.

use std::io;
use std::path::Path;

use gemchat_model::Image;
use mime::Mime;

/// Guesses the MIME type of an image from its file extension.
pub fn image_mime_type(path: &Path) -> Option<Mime> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "webp" => "image/webp".parse().ok()?,
        "heic" => "image/heic".parse().ok()?,
        "heif" => "image/heif".parse().ok()?,
        _ => return None,
    };
    Some(mime)
}

/// Reads an image file.
pub async fn load_image(path: &Path) -> io::Result<Image> {
    let Some(mime_type) = image_mime_type(path) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a supported image", path.display()),
        ));
    };
    let data = tokio::fs::read(path).await?;
    debug!("loaded {} ({} bytes)", path.display(), data.len());
    Ok(Image::new(data, mime_type))
}
