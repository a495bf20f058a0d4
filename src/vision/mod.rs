//! Vision Layer
//!
//! Shape classification of the sketched silhouette and imprint text
//! extraction via a cloud OCR service.

pub mod classify;
pub mod ocr;

pub use classify::{classify, ShapeLabel};
pub use ocr::{GoogleVisionOcr, OcrClient, OcrError};

use anyhow::{Context, Result};
use image::RgbImage;
use std::io::Cursor;

/// Encode a raster image as PNG bytes for the OCR service
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .context("Failed to encode sketch as PNG")?;
    Ok(buffer.into_inner())
}
