//! NSFW categories and classification results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Categories an image can be scored into.
///
/// Declaration order is also the tie-break priority: when two categories
/// share the top score, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NsfwCategory {
    /// Explicit photographic content.
    Porn,
    /// Explicit drawn or animated content.
    Hentai,
    /// Suggestive but not explicit content.
    Sexy,
    /// Illustrations and line art.
    Drawing,
    /// Reported when classification could not run.
    Neutral,
}

impl NsfwCategory {
    /// Categories that receive a score, in tie-break priority order.
    pub fn scored() -> &'static [NsfwCategory] {
        &[
            NsfwCategory::Porn,
            NsfwCategory::Hentai,
            NsfwCategory::Sexy,
            NsfwCategory::Drawing,
        ]
    }

    /// Returns the wire name of this category.
    pub fn name(&self) -> &'static str {
        match self {
            NsfwCategory::Porn => "porn",
            NsfwCategory::Hentai => "hentai",
            NsfwCategory::Sexy => "sexy",
            NsfwCategory::Drawing => "drawing",
            NsfwCategory::Neutral => "neutral",
        }
    }

    /// True for the categories that make a detection critical.
    pub fn is_explicit(&self) -> bool {
        matches!(self, NsfwCategory::Porn | NsfwCategory::Hentai)
    }
}

impl fmt::Display for NsfwCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of NSFW classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NsfwResult {
    /// Whether the dominant score exceeds its category threshold.
    pub detected: bool,
    /// Score of the dominant category (0.0 to 1.0).
    pub confidence: f32,
    /// Dominant category.
    pub category: NsfwCategory,
    /// Score per category, rounded to three decimals.
    pub scores: BTreeMap<NsfwCategory, f32>,
    /// Thresholds the scores were compared against.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub thresholds: BTreeMap<NsfwCategory, f32>,
}

impl NsfwResult {
    /// The result reported when classification could not run.
    pub fn neutral() -> Self {
        Self {
            detected: false,
            confidence: 0.0,
            category: NsfwCategory::Neutral,
            scores: NsfwCategory::scored().iter().map(|c| (*c, 0.0)).collect(),
            thresholds: BTreeMap::new(),
        }
    }

    /// Score of one category (0.0 if absent).
    pub fn score(&self, category: NsfwCategory) -> f32 {
        self.scores.get(&category).copied().unwrap_or(0.0)
    }
}
