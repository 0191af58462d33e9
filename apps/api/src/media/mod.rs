//! Uploaded image storage.
//!
//! The bucket behind `MediaStore` is the authoritative home of every uploaded
//! image; the database only keeps the public URL.

pub mod s3;

use async_trait::async_trait;

use crate::errors::AppError;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Identifies an upload by its leading bytes, ignoring any client-declared type.
pub fn sniff(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(PNG_SIGNATURE) {
        Some(ImageKind::Png)
    } else if bytes.starts_with(JPEG_SIGNATURE) {
        Some(ImageKind::Jpeg)
    } else {
        None
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, kind: ImageKind) -> Result<String, AppError>;

    /// Removes the object a URL returned by `put` points at. URLs this store
    /// did not issue are ignored.
    async fn delete_url(&self, url: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png_and_jpeg() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"rest");
        assert_eq!(sniff(&png), Some(ImageKind::Png));
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some(ImageKind::Jpeg));
    }

    #[test]
    fn test_sniff_rejects_other_payloads() {
        assert_eq!(sniff(b"GIF89a"), None);
        assert_eq!(sniff(b"<svg></svg>"), None);
        assert_eq!(sniff(&[]), None);
        assert_eq!(sniff(&PNG_SIGNATURE[..4]), None);
    }
}
