//! Hue/saturation/value helpers.
//!
//! Uses the 8-bit convention common to vision tooling: hue in `0..180`
//! (degrees halved), saturation and value in `0..=255`.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Converts one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = (h / 2.0).round() as u16 % 180;
    [h as u8, s.round() as u8, max as u8]
}

/// An inclusive HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// True if every channel lies within the band.
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// Skin tones.
pub const SKIN_BAND: HsvBand = HsvBand::new([0, 20, 70], [20, 255, 255]);

/// Colors typical of game interfaces: blue, green, gold.
pub const UI_BANDS: [HsvBand; 3] = [
    HsvBand::new([100, 50, 50], [130, 255, 255]),
    HsvBand::new([40, 50, 50], [80, 255, 255]),
    HsvBand::new([15, 50, 50], [35, 255, 255]),
];

/// Counts pixels inside `band`.
pub fn count_in_band(image: &RgbImage, band: &HsvBand) -> u64 {
    image
        .pixels()
        .filter(|p| band.contains(rgb_to_hsv(p)))
        .count() as u64
}

/// Sums per-band pixel counts. A pixel inside two overlapping bands is
/// counted twice.
pub fn count_in_bands(image: &RgbImage, bands: &[HsvBand]) -> u64 {
    let mut total = 0u64;
    for pixel in image.pixels() {
        let hsv = rgb_to_hsv(pixel);
        total += bands.iter().filter(|b| b.contains(hsv)).count() as u64;
    }
    total
}
