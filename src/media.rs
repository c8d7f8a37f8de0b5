use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::CookmateError;

/// Represents the source of a photo to identify ingredients in
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image from a file path, e.g. the URI returned by the camera or photo library
    Path(String),
    /// Image as base64-encoded data
    Base64 { data: String, mime_type: String },
}

/// An image ready to be sent inline to the generative model
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// Load an image source into an inline image
///
/// # Errors
/// Returns `PermissionDenied` when the OS refuses access to the file, and
/// `InvalidInput` for an empty path or empty data.
pub async fn load(source: &ImageSource) -> Result<InlineImage, CookmateError> {
    match source {
        ImageSource::Path(path) => load_file(path).await,
        ImageSource::Base64 { data, mime_type } => {
            if data.trim().is_empty() {
                return Err(CookmateError::InvalidInput(
                    "image data is empty".to_string(),
                ));
            }
            Ok(InlineImage {
                mime_type: mime_type.clone(),
                data: data.clone(),
            })
        }
    }
}

async fn load_file(path: &str) -> Result<InlineImage, CookmateError> {
    if path.trim().is_empty() {
        return Err(CookmateError::InvalidInput(
            "no image selected".to_string(),
        ));
    }
    let path = path.strip_prefix("file://").unwrap_or(path);

    let image_data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => {
            CookmateError::PermissionDenied(format!("cannot read image {}", path))
        }
        _ => CookmateError::Io(e),
    })?;
    debug!("Read {} bytes from {}", image_data.len(), path);

    Ok(InlineImage {
        mime_type: mime_type_for(Path::new(path)).to_string(),
        data: STANDARD.encode(&image_data),
    })
}

/// Guess the image MIME type from the file extension, defaulting to JPEG
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("photo.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("IMG_0001.HEIC")), "image/heic");
        assert_eq!(mime_type_for(Path::new("no_extension")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"test data").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let image = load(&ImageSource::Path(path)).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, STANDARD.encode(b"test data"));
    }

    #[tokio::test]
    async fn test_load_file_uri() {
        let mut file = tempfile::Builder::new().suffix(".jpeg").tempfile().unwrap();
        file.write_all(b"jpeg bytes").unwrap();

        let uri = format!("file://{}", file.path().to_str().unwrap());
        let image = load(&ImageSource::Path(uri)).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = load(&ImageSource::Path("/definitely/not/here.jpg".to_string())).await;
        assert!(matches!(result, Err(CookmateError::Io(_))));
    }

    #[tokio::test]
    async fn test_empty_sources_rejected() {
        let result = load(&ImageSource::Path("  ".to_string())).await;
        assert!(matches!(result, Err(CookmateError::InvalidInput(_))));

        let result = load(&ImageSource::Base64 {
            data: String::new(),
            mime_type: "image/png".to_string(),
        })
        .await;
        assert!(matches!(result, Err(CookmateError::InvalidInput(_))));
    }
}
