//! Heuristic NSFW classifier.
//!
//! Each category score is a fixed linear combination of the three visual
//! signals, clamped to 1.0. The dominant category is detected when its
//! score strictly exceeds that category's threshold.

use std::collections::BTreeMap;

use tracing::debug;

use super::{NsfwCategory, NsfwResult};
use crate::config::ThresholdConfig;
use crate::features::NsfwSignals;
use crate::round3;

/// Weights of one category formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub skin: f32,
    pub edge: f32,
    pub variance: f32,
}

impl SignalWeights {
    /// Weighted sum of the signals, clamped to `[0, 1]`.
    pub fn apply(&self, signals: &NsfwSignals) -> f32 {
        let raw = signals.skin_ratio * self.skin
            + signals.edge_density * self.edge
            + signals.color_variance * self.variance;
        raw.clamp(0.0, 1.0)
    }
}

pub const PORN_WEIGHTS: SignalWeights = SignalWeights {
    skin: 1.5,
    edge: 0.3,
    variance: 0.0,
};

pub const HENTAI_WEIGHTS: SignalWeights = SignalWeights {
    skin: 0.0,
    edge: 0.5,
    variance: 0.8,
};

pub const SEXY_WEIGHTS: SignalWeights = SignalWeights {
    skin: 1.2,
    edge: 0.0,
    variance: 0.4,
};

pub const DRAWING_WEIGHTS: SignalWeights = SignalWeights {
    skin: 0.0,
    edge: 1.3,
    variance: 0.6,
};

/// Formula weights for a scored category.
pub fn weights_for(category: NsfwCategory) -> Option<SignalWeights> {
    match category {
        NsfwCategory::Porn => Some(PORN_WEIGHTS),
        NsfwCategory::Hentai => Some(HENTAI_WEIGHTS),
        NsfwCategory::Sexy => Some(SEXY_WEIGHTS),
        NsfwCategory::Drawing => Some(DRAWING_WEIGHTS),
        NsfwCategory::Neutral => None,
    }
}

/// Unrounded scores for every scored category, in priority order.
pub fn category_scores(signals: &NsfwSignals) -> Vec<(NsfwCategory, f32)> {
    NsfwCategory::scored()
        .iter()
        .filter_map(|c| weights_for(*c).map(|w| (*c, w.apply(signals))))
        .collect()
}

/// Picks the highest score; earlier categories win ties.
fn dominant(scores: &[(NsfwCategory, f32)]) -> (NsfwCategory, f32) {
    let mut best = (NsfwCategory::Neutral, f32::NEG_INFINITY);
    for (category, score) in scores {
        if *score > best.1 {
            best = (*category, *score);
        }
    }
    if best.1.is_finite() {
        best
    } else {
        (NsfwCategory::Neutral, 0.0)
    }
}

/// Classifies pre-computed signals against the configured thresholds.
pub fn classify(signals: &NsfwSignals, thresholds: &ThresholdConfig) -> NsfwResult {
    let scores = category_scores(signals);
    let (category, score) = dominant(&scores);
    let detected = score > thresholds.for_category(category);

    debug!(
        skin = signals.skin_ratio,
        edges = signals.edge_density,
        variance = signals.color_variance,
        %category,
        score,
        detected,
        "NSFW classification"
    );

    NsfwResult {
        detected,
        confidence: round3(score),
        category,
        scores: scores
            .into_iter()
            .map(|(c, s)| (c, round3(s)))
            .collect::<BTreeMap<_, _>>(),
        thresholds: thresholds.nsfw_map(),
    }
}
