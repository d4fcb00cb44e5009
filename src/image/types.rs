//! Core types for image generation.

use crate::error::{OmniGenError, Result};
use crate::social::{AspectRatio, ImageResolution};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Maps a MIME type onto a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A request for one post image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// The visual description to render.
    pub prompt: String,
    /// Concrete aspect ratio of the output.
    pub aspect_ratio: AspectRatio,
    /// Resolution tier of the output.
    pub resolution: ImageResolution,
}

impl ImageRequest {
    /// Creates a square 1K request for `prompt`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::Square,
            resolution: ImageResolution::default(),
        }
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the resolution tier.
    pub fn with_resolution(mut self, resolution: ImageResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Rejects requests the image model cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(OmniGenError::InvalidRequest(
                "image prompt must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or embedded"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Model that produced the image, if known.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            data,
            format,
            model: None,
            duration_ms: None,
        }
    }

    /// Decodes an embeddable data URI back into an image.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let format = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .and_then(ImageFormat::from_mime_type)
            .unwrap_or_default();
        let data = decode_base64_lenient(url).map_err(|e| OmniGenError::Decode(e.to_string()))?;
        Ok(Self::new(data, format))
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            self.to_base64()
        )
    }
}

/// Decodes base64 that may carry a data URI prefix, embedded whitespace,
/// or missing padding.
fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_data_url_prefix() {
        let image = GeneratedImage::new(PNG_MAGIC.to_vec(), ImageFormat::Png);
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_from_data_url_restores_bytes_and_format() {
        let image = GeneratedImage::new(JPEG_MAGIC.to_vec(), ImageFormat::Jpeg);
        let decoded = GeneratedImage::from_data_url(&image.to_data_url()).unwrap();
        assert_eq!(decoded.data, JPEG_MAGIC.to_vec());
        assert_eq!(decoded.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_lenient_decode_handles_whitespace_and_padding() {
        assert_eq!(decode_base64_lenient("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64_lenient("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_from_data_url_rejects_garbage() {
        let err = GeneratedImage::from_data_url("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, OmniGenError::Decode(_)));
    }

    #[test]
    fn test_request_validation() {
        assert!(ImageRequest::new("a cup").validate().is_ok());
        assert!(ImageRequest::new("  ").validate().is_err());
    }

    #[test]
    fn test_request_builder() {
        let req = ImageRequest::new("a cup")
            .with_aspect_ratio(AspectRatio::Portrait3x4)
            .with_resolution(ImageResolution::TwoK);
        assert_eq!(req.aspect_ratio, AspectRatio::Portrait3x4);
        assert_eq!(req.resolution, ImageResolution::TwoK);
    }

    #[test]
    fn test_save_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        GeneratedImage::new(PNG_MAGIC.to_vec(), ImageFormat::Png)
            .save(&path)
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC.to_vec());
    }
}
