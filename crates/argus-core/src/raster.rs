//! Decoded raster images.

use std::sync::OnceLock;

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::error::AnalysisError;

/// An immutable decoded RGB image, owned by one request.
///
/// The grayscale and edge derivatives are computed once on first use and
/// shared by every detector that needs them.
#[derive(Debug)]
pub struct RasterImage {
    rgb: RgbImage,
    gray: OnceLock<GrayImage>,
    edges: OnceLock<GrayImage>,
}

impl RasterImage {
    /// Decodes raw bytes (JPEG, PNG, GIF first frame, WebP) into RGB.
    pub fn decode(data: &[u8], max_bytes: usize) -> Result<Self, AnalysisError> {
        if data.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        if data.len() > max_bytes {
            return Err(AnalysisError::ImageTooLarge(data.len(), max_bytes));
        }

        let decoded = image::load_from_memory(data)?;
        let rgb = decoded.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(AnalysisError::Decode("image has zero area".to_string()));
        }

        debug!(width = rgb.width(), height = rgb.height(), "decoded image");
        Ok(Self::from_rgb(rgb))
    }

    /// Wraps an already decoded image.
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self {
            rgb,
            gray: OnceLock::new(),
            edges: OnceLock::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.rgb.width() as u64 * self.rgb.height() as u64
    }

    /// The RGB pixel grid.
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luma conversion of the image.
    pub fn gray(&self) -> &GrayImage {
        self.gray
            .get_or_init(|| image::DynamicImage::ImageRgb8(self.rgb.clone()).to_luma8())
    }

    /// Binary edge map of the grayscale image.
    pub fn edges(&self) -> &GrayImage {
        self.edges
            .get_or_init(|| crate::features::edge_map(self.gray()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png() {
        let raster = RasterImage::decode(&png_bytes(8, 4), 1024 * 1024).unwrap();
        assert_eq!(raster.width(), 8);
        assert_eq!(raster.height(), 4);
        assert_eq!(raster.pixel_count(), 32);
        assert_eq!(raster.gray().dimensions(), (8, 4));
    }

    #[test]
    fn rejects_garbage() {
        let err = RasterImage::decode(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(matches!(
            RasterImage::decode(&[], 1024),
            Err(AnalysisError::EmptyInput)
        ));
        let bytes = png_bytes(16, 16);
        assert!(matches!(
            RasterImage::decode(&bytes, 10),
            Err(AnalysisError::ImageTooLarge(_, 10))
        ));
    }
}
