//! Heuristic game-activity classifier and title identification.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::GameTitle;
use crate::config::ThresholdConfig;
use crate::features::GameSignals;
use crate::round3;

/// Title reported when no catalog entry matches.
pub const UNKNOWN_GAME: &str = "unknown";

/// Weights of the combined game score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameWeights {
    pub hud: f32,
    pub ui: f32,
    pub colors: f32,
    pub text: f32,
}

pub const GAME_WEIGHTS: GameWeights = GameWeights {
    hud: 0.4,
    ui: 0.3,
    colors: 0.2,
    text: 0.1,
};

impl GameWeights {
    /// Weighted sum of the signals, clamped to `[0, 1]`.
    pub fn apply(&self, signals: &GameSignals) -> f32 {
        let raw = signals.hud_elements * self.hud
            + signals.ui_patterns * self.ui
            + signals.game_colors * self.colors
            + signals.text_density * self.text;
        raw.clamp(0.0, 1.0)
    }
}

/// Result of game classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Whether the combined score exceeds the game threshold.
    pub detected: bool,
    /// Combined score, rounded to three decimals.
    pub confidence: f32,
    /// Best-effort identified title, or `unknown`.
    pub game_name: String,
    /// Individual signals, rounded to three decimals.
    pub scores: GameSignals,
    /// Threshold the combined score was compared against.
    pub threshold: f32,
}

impl GameResult {
    /// The result reported when classification could not run.
    pub fn not_detected(threshold: f32) -> Self {
        Self {
            detected: false,
            confidence: 0.0,
            game_name: UNKNOWN_GAME.to_string(),
            scores: GameSignals::default(),
            threshold,
        }
    }
}

/// First catalog title whose keywords occur in the lower-cased text.
pub fn identify_title(text: &str, titles: &[GameTitle]) -> String {
    let lower = text.to_lowercase();
    titles
        .iter()
        .find(|t| t.keywords.iter().any(|k| lower.contains(k.as_str())))
        .map(|t| t.name.clone())
        .unwrap_or_else(|| UNKNOWN_GAME.to_string())
}

/// Classifies pre-computed signals against the game threshold.
pub fn classify(
    signals: &GameSignals,
    ocr_text: &str,
    titles: &[GameTitle],
    thresholds: &ThresholdConfig,
) -> GameResult {
    let combined = GAME_WEIGHTS.apply(signals);
    let detected = combined > thresholds.game;
    let game_name = identify_title(ocr_text, titles);

    debug!(
        hud = signals.hud_elements,
        ui = signals.ui_patterns,
        colors = signals.game_colors,
        text = signals.text_density,
        combined,
        detected,
        game = %game_name,
        "game classification"
    );

    GameResult {
        detected,
        confidence: round3(combined),
        game_name,
        scores: GameSignals {
            hud_elements: round3(signals.hud_elements),
            ui_patterns: round3(signals.ui_patterns),
            game_colors: round3(signals.game_colors),
            text_density: round3(signals.text_density),
        },
        threshold: thresholds.game,
    }
}
