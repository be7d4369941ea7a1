//! Image cleanup ahead of recognition.
//!
//! grayscale → 5x5 Gaussian smoothing → Gaussian adaptive threshold
//! (block 11, C = 2) → 2x2 morphological closing.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{grayscale_close, Mask};

/// Sigma equivalent to a 5x5 Gaussian kernel.
const SMOOTHING_SIGMA: f32 = 1.1;
/// Sigma of the Gaussian weights over an 11x11 threshold block.
const THRESHOLD_BLOCK_SIGMA: f32 = 2.0;
/// Constant subtracted from the weighted local mean.
const THRESHOLD_C: f32 = 2.0;

/// Returns a cleaned binary image ready for OCR.
pub fn preprocess_for_ocr(gray: &GrayImage) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    let smoothed = gaussian_blur_f32(gray, SMOOTHING_SIGMA);
    let binary = adaptive_threshold(&smoothed);
    close_2x2(&binary)
}

/// Pixels brighter than their Gaussian-weighted neighborhood mean minus C
/// become white, everything else black.
fn adaptive_threshold(gray: &GrayImage) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, THRESHOLD_BLOCK_SIGMA);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0] as f32;
        let mean = local_mean.get_pixel(x, y).0[0] as f32;
        if value > mean - THRESHOLD_C {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Dilation followed by erosion with a 2x2 structuring element anchored at
/// its bottom-right cell.
fn close_2x2(image: &GrayImage) -> GrayImage {
    let element = GrayImage::from_pixel(2, 2, Luma([255]));
    grayscale_close(image, &Mask::from_image(&element, 1, 1))
}
