//! Signals behind the game classifier.

use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

use super::color::{count_in_bands, UI_BANDS};
use super::ratio;
use crate::raster::RasterImage;

/// Image area that is expected to hold one HUD panel.
const AREA_PER_EXPECTED_SHAPE: f64 = 50_000.0;
/// Polygon approximation tolerance as a fraction of the contour perimeter.
const POLY_EPSILON_FACTOR: f64 = 0.02;
/// Intensities at or above this count as bright.
const BRIGHT_INTENSITY: u8 = 200;

/// Outermost quadrilateral regions of the grayscale image (any non-zero
/// pixel is foreground), normalized by the number of HUD panels an image of
/// this size is expected to contain.
pub fn hud_shape_count(image: &RasterImage) -> f32 {
    if image.pixel_count() == 0 {
        return 0.0;
    }

    let quads = find_contours::<i32>(image.gray())
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter(|c| is_quadrilateral(&c.points))
        .count();

    normalize_shape_count(quads, image.width(), image.height())
}

/// Whether the closed outline simplifies to four vertices. Outlines of
/// fewer than three points have no perimeter to derive a tolerance from.
fn is_quadrilateral(points: &[Point<i32>]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let perimeter = arc_length(points, true);
    if perimeter <= 0.0 {
        return false;
    }
    approximate_polygon_dp(points, POLY_EPSILON_FACTOR * perimeter, true).len() == 4
}

/// `count / (width * height / 50000)`, clamped to 1.0. Zero for images too
/// small to expect any shape.
pub fn normalize_shape_count(count: usize, width: u32, height: u32) -> f32 {
    let expected = (width as f64 * height as f64) / AREA_PER_EXPECTED_SHAPE;
    if expected <= 0.0 {
        return 0.0;
    }
    (count as f64 / expected).min(1.0) as f32
}

/// Fraction of pixels in the blue, green, and gold interface bands.
pub fn ui_color_ratio(image: &RasterImage) -> f32 {
    ratio(count_in_bands(image.rgb(), &UI_BANDS), image.pixel_count())
}

/// Share of bright channel values across all three channels.
pub fn saturation_score(image: &RasterImage) -> f32 {
    let bright = image
        .rgb()
        .pixels()
        .flat_map(|p| p.0)
        .filter(|v| *v >= BRIGHT_INTENSITY)
        .count() as u64;
    ratio(bright, 3 * image.pixel_count())
}

/// Recognized characters per thousand pixels, divided by ten and clamped.
pub fn text_density(text: &str, width: u32, height: u32) -> f32 {
    let area = width as f64 * height as f64;
    if area == 0.0 {
        return 0.0;
    }
    let length = text.trim().chars().count() as f64;
    let density = length / (area / 1000.0);
    (density / 10.0).min(1.0) as f32
}
