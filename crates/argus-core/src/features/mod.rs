//! Visual feature extraction.
//!
//! Every extractor is a pure function of one [`RasterImage`] (plus the OCR
//! text for `text_density`) returning a signal normalized to `[0, 1]`.

pub mod color;
mod game;
mod visual;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::raster::RasterImage;

pub use game::{
    hud_shape_count, normalize_shape_count, saturation_score, text_density, ui_color_ratio,
};
pub use visual::{color_variance, edge_density, edge_map, skin_tone_ratio};

/// Signals consumed by the NSFW classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NsfwSignals {
    pub skin_ratio: f32,
    pub edge_density: f32,
    pub color_variance: f32,
}

impl NsfwSignals {
    pub fn extract(image: &RasterImage) -> Result<Self, FeatureError> {
        ensure_area(image)?;
        Ok(Self {
            skin_ratio: skin_tone_ratio(image),
            edge_density: edge_density(image),
            color_variance: color_variance(image),
        })
    }
}

/// Signals consumed by the game classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSignals {
    pub hud_elements: f32,
    pub ui_patterns: f32,
    pub game_colors: f32,
    pub text_density: f32,
}

impl GameSignals {
    pub fn extract(image: &RasterImage, ocr_text: &str) -> Result<Self, FeatureError> {
        ensure_area(image)?;
        Ok(Self {
            hud_elements: hud_shape_count(image),
            ui_patterns: ui_color_ratio(image),
            game_colors: saturation_score(image),
            text_density: text_density(ocr_text, image.width(), image.height()),
        })
    }
}

/// All named signals derived from one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub skin_ratio: f32,
    pub edge_density: f32,
    pub color_variance: f32,
    pub hud_shape_count: f32,
    pub ui_color_ratio: f32,
    pub saturation_score: f32,
    pub text_density: f32,
}

impl FeatureVector {
    /// Combines both signal families. A family that failed contributes zeros.
    pub fn from_parts(nsfw: Option<&NsfwSignals>, game: Option<&GameSignals>) -> Self {
        let nsfw = nsfw.copied().unwrap_or_default();
        let game = game.copied().unwrap_or_default();
        Self {
            skin_ratio: nsfw.skin_ratio,
            edge_density: nsfw.edge_density,
            color_variance: nsfw.color_variance,
            hud_shape_count: game.hud_elements,
            ui_color_ratio: game.ui_patterns,
            saturation_score: game.game_colors,
            text_density: game.text_density,
        }
    }
}

fn ensure_area(image: &RasterImage) -> Result<(), FeatureError> {
    if image.pixel_count() == 0 {
        Err(FeatureError::EmptyImage)
    } else {
        Ok(())
    }
}

/// Ratio of `count` to `total`, clamped to 1.0; zero when `total` is zero.
pub(crate) fn ratio(count: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64).min(1.0) as f32
    }
}
