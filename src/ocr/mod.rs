//! Image-to-text extraction through an external OCR engine.

pub mod tesseract;

pub use tesseract::TesseractCli;

use crate::error::OcrError;
use async_trait::async_trait;
use image::ImageFormat;
use std::io::Cursor;

/// Content types accepted for upload
pub const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// An engine turning image bytes into plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Raw text recognised in `image`
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;

    /// Whether the engine can currently be invoked
    async fn is_available(&self) -> bool;
}

/// Decodes a PNG or JPEG upload and re-encodes it as a grayscale PNG
pub fn prepare_image(bytes: &[u8]) -> Result<Vec<u8>, OcrError> {
    let format = image::guess_format(bytes).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(OcrError::InvalidImage(format!("{:?} is not supported", format)));
    }

    let gray = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?
        .to_luma8();

    let mut png = Cursor::new(Vec::new());
    gray.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| OcrError::Failed(format!("failed to encode grayscale image: {}", e)))?;
    Ok(png.into_inner())
}

pub fn is_supported_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    SUPPORTED_CONTENT_TYPES.contains(&essence.as_str())
}

/// Trims every line and drops blank ones
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
