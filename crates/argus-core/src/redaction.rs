//! Graduated blur and provenance watermark.
//!
//! Redaction never touches the decoded image: it blurs a copy, stamps the
//! watermark into the bottom-right corner and hands the copy back.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::NsfwCategory;

/// Monospace font used for the watermark unless another one is configured.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

/// Glyph height used when a font is available.
const WATERMARK_SCALE: f32 = 12.0;
/// Text size estimate per character when no font could be loaded.
const FALLBACK_CHAR_WIDTH: u32 = 6;
const FALLBACK_TEXT_HEIGHT: u32 = 11;
/// Distance of the text from the bottom-right corner.
const MARGIN: i64 = 10;

/// Blur strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurLevel {
    Light,
    Medium,
    Heavy,
    Extreme,
}

impl BlurLevel {
    /// Gaussian blur radius in pixels.
    pub fn radius(&self) -> u32 {
        match self {
            BlurLevel::Light => 3,
            BlurLevel::Medium => 8,
            BlurLevel::Heavy => 15,
            BlurLevel::Extreme => 25,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlurLevel::Light => "light",
            BlurLevel::Medium => "medium",
            BlurLevel::Heavy => "heavy",
            BlurLevel::Extreme => "extreme",
        }
    }
}

impl fmt::Display for BlurLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the blur level for a set of detector decisions. `None` means the
/// image is left alone.
pub fn select_blur_level(
    nsfw_detected: bool,
    nsfw_category: NsfwCategory,
    game_detected: bool,
) -> Option<BlurLevel> {
    if nsfw_detected {
        Some(match nsfw_category {
            NsfwCategory::Porn => BlurLevel::Heavy,
            NsfwCategory::Sexy => BlurLevel::Medium,
            _ => BlurLevel::Light,
        })
    } else if game_detected {
        Some(BlurLevel::Light)
    } else {
        None
    }
}

/// A redacted copy of the analyzed image.
#[derive(Debug, Clone, Serialize)]
pub struct BlurOutcome {
    pub applied: bool,
    pub level: BlurLevel,
    pub radius: u32,
    pub watermark_text: String,
    /// False when the watermark glyphs could not be drawn and only the
    /// background box was stamped.
    pub watermark_rendered: bool,
    #[serde(skip)]
    pub artifact: RgbImage,
}

impl BlurOutcome {
    /// Encodes the redacted image as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Cursor::new(Vec::new());
        self.artifact.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// Applies blur and watermark.
pub struct Redactor {
    font: Option<FontArc>,
}

impl Redactor {
    /// Redactor using the bundled monospace font.
    pub fn new() -> Self {
        match FontArc::try_from_slice(BUNDLED_FONT) {
            Ok(font) => Self::with_font(font),
            Err(e) => {
                warn!(error = %e, "bundled watermark font unreadable");
                Self::without_font()
            }
        }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Redactor that only stamps the watermark box, sized by estimate.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    /// Loads the watermark font from `path`, or the bundled one when no path
    /// is given. An unreadable font is logged and replaced by the bundled one.
    pub fn from_font_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::new();
        };
        let font = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));
        match font {
            Ok(font) => {
                debug!(path = %path.display(), "loaded watermark font");
                Self::with_font(font)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "watermark font unavailable, using bundled font"
                );
                Self::new()
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Blurs a copy of `image` and stamps the watermark for `at`.
    pub fn redact(&self, image: &RgbImage, level: BlurLevel, at: DateTime<Utc>) -> BlurOutcome {
        let radius = level.radius();
        let mut blurred = gaussian_blur_f32(image, radius as f32);

        let text = watermark_text(level, at);
        let rendered = self.stamp(&mut blurred, &text);

        debug!(%level, radius, rendered, "image redacted");

        BlurOutcome {
            applied: true,
            level,
            radius,
            watermark_text: text,
            watermark_rendered: rendered,
            artifact: blurred,
        }
    }

    /// Draws the background box and, if possible, the text. Returns whether
    /// the glyphs were drawn.
    fn stamp(&self, canvas: &mut RgbImage, text: &str) -> bool {
        let scale = PxScale::from(WATERMARK_SCALE);
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(scale, font, text),
            None => (
                text.chars().count() as u32 * FALLBACK_CHAR_WIDTH,
                FALLBACK_TEXT_HEIGHT,
            ),
        };

        let x = canvas.width() as i64 - text_w as i64 - MARGIN;
        let y = canvas.height() as i64 - text_h as i64 - MARGIN;
        darken_box(
            canvas,
            x - 5,
            y - 2,
            x + text_w as i64 + 5,
            y + text_h as i64 + 2,
        );

        match &self.font {
            Some(font) => {
                draw_text_mut(
                    canvas,
                    Rgb([255, 255, 255]),
                    x as i32,
                    y as i32,
                    scale,
                    font,
                    text,
                );
                true
            }
            None => false,
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// `EVIDENCE - <LEVEL> - <UTC timestamp>`.
pub fn watermark_text(level: BlurLevel, at: DateTime<Utc>) -> String {
    format!(
        "EVIDENCE - {} - {}",
        level.name().to_uppercase(),
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Blends black at half opacity over the inclusive box, clipped to the
/// canvas.
fn darken_box(canvas: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64) {
    let w = canvas.width() as i64;
    let h = canvas.height() as i64;
    let (x0, x1) = (x0.max(0), x1.min(w - 1));
    let (y0, y1) = (y0.max(0), y1.min(h - 1));
    if x0 > x1 || y0 > y1 {
        return;
    }
    for y in y0..=y1 {
        for x in x0..=x1 {
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            pixel.0 = pixel.0.map(|c| c / 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn blur_level_truth_table() {
        use NsfwCategory::*;
        for game in [false, true] {
            assert_eq!(select_blur_level(true, Porn, game), Some(BlurLevel::Heavy));
            assert_eq!(select_blur_level(true, Sexy, game), Some(BlurLevel::Medium));
            assert_eq!(select_blur_level(true, Hentai, game), Some(BlurLevel::Light));
            assert_eq!(select_blur_level(true, Drawing, game), Some(BlurLevel::Light));
        }
        for category in [Porn, Hentai, Sexy, Drawing, Neutral] {
            assert_eq!(
                select_blur_level(false, category, true),
                Some(BlurLevel::Light)
            );
            assert_eq!(select_blur_level(false, category, false), None);
        }
    }

    #[test]
    fn radii() {
        assert_eq!(BlurLevel::Light.radius(), 3);
        assert_eq!(BlurLevel::Medium.radius(), 8);
        assert_eq!(BlurLevel::Heavy.radius(), 15);
        assert_eq!(BlurLevel::Extreme.radius(), 25);
    }

    #[test]
    fn watermark_names_level_and_time() {
        assert_eq!(
            watermark_text(BlurLevel::Heavy, at()),
            "EVIDENCE - HEAVY - 2024-03-01 12:30:00"
        );
    }

    #[test]
    fn redaction_leaves_original_untouched() {
        let mut original = RgbImage::from_pixel(300, 60, Rgb([200, 200, 200]));
        original.put_pixel(10, 10, Rgb([0, 0, 0]));
        let snapshot = original.clone();

        let outcome = Redactor::new().redact(&original, BlurLevel::Light, at());
        assert_eq!(original, snapshot);
        assert!(outcome.applied);
        assert!(outcome.watermark_rendered);
        assert_eq!(outcome.radius, 3);
        assert_eq!(outcome.artifact.dimensions(), (300, 60));
    }

    #[test]
    fn fallback_box_darkens_bottom_right() {
        let original = RgbImage::from_pixel(300, 60, Rgb([200, 200, 200]));
        let outcome = Redactor::without_font().redact(&original, BlurLevel::Light, at());
        assert!(!outcome.watermark_rendered);
        // Inside the box: halved. Top-left corner: untouched by the box.
        assert!(outcome.artifact.get_pixel(285, 45).0[0] <= 100);
        assert!(outcome.artifact.get_pixel(0, 0).0[0] >= 198);
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let original = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let outcome = Redactor::new().redact(&original, BlurLevel::Heavy, at());
        assert_eq!(outcome.artifact.dimensions(), (4, 4));
    }

    #[test]
    fn default_redactor_draws_watermark_glyphs() {
        let original = RgbImage::from_pixel(300, 60, Rgb([200, 200, 200]));
        let outcome = Redactor::default().redact(&original, BlurLevel::Heavy, at());
        assert!(outcome.watermark_rendered);
        // White glyphs are the only pixels brighter than the background.
        let bright = outcome.artifact.pixels().filter(|p| p.0[0] > 210).count();
        assert!(bright > 0);
        assert!(outcome.artifact.get_pixel(0, 0).0[0] >= 198);
    }

    #[test]
    fn missing_font_falls_back_to_bundled() {
        let redactor = Redactor::from_font_path(Some(Path::new("/nonexistent/font.ttf")));
        assert!(redactor.has_font());
        assert!(Redactor::from_font_path(None).has_font());
        assert!(!Redactor::without_font().has_font());
    }

    #[test]
    fn encodes_png() {
        let original = RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]));
        let outcome = Redactor::new().redact(&original, BlurLevel::Light, at());
        let png = outcome.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
