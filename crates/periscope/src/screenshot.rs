//! Screenshot encoding helpers
//!
//! Captures arrive as raw RGBA frames from the mirrored window; nodes store
//! them as base64 PNG, resized so snapshots stay small enough to embed in
//! bundles.

use base64::{engine::general_purpose, Engine as _};
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba};
use std::io::Cursor;
use thiserror::Error;

/// Default maximum dimension for screenshot resizing (width or height)
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;

/// Errors during screenshot encoding
#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] image::ImageError),
}

/// One raw RGBA frame of the mirrored window.
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    /// Raw image data in RGBA format
    pub image_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ScreenshotResult {
    pub fn new(image_data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            image_data,
            width,
            height,
        }
    }

    /// Encode the frame as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, ScreenshotError> {
        encode_rgba_to_png(&self.image_data, self.width, self.height)
    }

    /// Encode as PNG, resizing so neither dimension exceeds `max_dimension`
    /// (default [`DEFAULT_MAX_DIMENSION`]); aspect ratio is preserved.
    pub fn to_png_resized(&self, max_dimension: Option<u32>) -> Result<Vec<u8>, ScreenshotError> {
        let max_dim = max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION);
        if self.width <= max_dim && self.height <= max_dim {
            return self.to_png();
        }

        let scale = (max_dim as f32 / self.width.max(self.height) as f32).min(1.0);
        let new_width = ((self.width as f32 * scale).round() as u32).max(1);
        let new_height = ((self.height as f32 * scale).round() as u32).max(1);

        let img = ImageBuffer::<Rgba<u8>, _>::from_raw(
            self.width,
            self.height,
            self.image_data.clone(),
        )
        .ok_or_else(|| ScreenshotError::ImageProcessing("image buffer size mismatch".into()))?;

        let resized = image::imageops::resize(&img, new_width, new_height, FilterType::Lanczos3);
        encode_rgba_to_png(&resized.into_raw(), new_width, new_height)
    }

    /// Base64 PNG, the form stored on screen nodes.
    pub fn to_base64_png(&self) -> Result<String, ScreenshotError> {
        Ok(general_purpose::STANDARD.encode(self.to_png()?))
    }

    /// Base64 PNG with resizing.
    pub fn to_base64_png_resized(
        &self,
        max_dimension: Option<u32>,
    ) -> Result<String, ScreenshotError> {
        Ok(general_purpose::STANDARD.encode(self.to_png_resized(max_dimension)?))
    }
}

fn encode_rgba_to_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScreenshotError> {
    let img = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| ScreenshotError::ImageProcessing("image buffer size mismatch".into()))?;
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img).write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}
