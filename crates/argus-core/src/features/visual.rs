//! Signals behind the NSFW classifier.

use image::GrayImage;
use imageproc::edges::canny;

use super::color::{count_in_band, SKIN_BAND};
use super::ratio;
use crate::raster::RasterImage;

/// Hysteresis thresholds for edge detection. `canny` smooths with sigma 1.4
/// and measures the L2 Sobel magnitude, which gives roughly half the response
/// of an unsmoothed L1 gradient on a step. These are the usual 50/150 pair
/// scaled to that response, so a luma step of about 38 is still an edge.
const CANNY_LOW: f32 = 25.0;
const CANNY_HIGH: f32 = 75.0;
/// Standard deviation that maps to a color variance of 1.0.
const VARIANCE_NORMALIZER: f64 = 128.0;

/// Canny edge map with fixed thresholds.
pub fn edge_map(gray: &GrayImage) -> GrayImage {
    canny(gray, CANNY_LOW, CANNY_HIGH)
}

/// Fraction of pixels inside the skin-tone band.
pub fn skin_tone_ratio(image: &RasterImage) -> f32 {
    ratio(count_in_band(image.rgb(), &SKIN_BAND), image.pixel_count())
}

/// Fraction of pixels that are edges.
pub fn edge_density(image: &RasterImage) -> f32 {
    if image.pixel_count() == 0 {
        return 0.0;
    }
    let edge_pixels = image.edges().pixels().filter(|p| p.0[0] > 0).count() as u64;
    ratio(edge_pixels, image.pixel_count())
}

/// Mean of the per-channel standard deviations, divided by 128 and clamped.
pub fn color_variance(image: &RasterImage) -> f32 {
    let total = image.pixel_count();
    if total == 0 {
        return 0.0;
    }

    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    for pixel in image.rgb().pixels() {
        for c in 0..3 {
            let v = pixel.0[c] as f64;
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }

    let n = total as f64;
    let mean_std = (0..3)
        .map(|c| {
            let mean = sum[c] / n;
            (sum_sq[c] / n - mean * mean).max(0.0).sqrt()
        })
        .sum::<f64>()
        / 3.0;

    (mean_std / VARIANCE_NORMALIZER).min(1.0) as f32
}
