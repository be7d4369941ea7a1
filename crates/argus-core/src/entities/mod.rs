//! Entities extracted from recognized text.
//!
//! URLs and software mentions are pattern-matched against the OCR text.
//! Software is additionally probed visually through color signatures.

mod software;
mod url;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::ThresholdConfig;
use crate::raster::RasterImage;
use crate::round3;

pub use self::software::{detect_software, detect_visual, text_confidence, title_case};
pub use self::url::{classify_url, is_valid_url, UrlExtractor, URL_CONFIDENCE};

/// How an entity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Text,
    Visual,
}

/// URL categories, in the order they are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCategory {
    SocialMedia,
    Development,
    Video,
    News,
    General,
}

impl UrlCategory {
    pub fn name(&self) -> &'static str {
        match self {
            UrlCategory::SocialMedia => "social_media",
            UrlCategory::Development => "development",
            UrlCategory::Video => "video",
            UrlCategory::News => "news",
            UrlCategory::General => "general",
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Software catalog groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftwareCategory {
    Browsers,
    Office,
    Development,
    Communication,
    Media,
    Games,
}

impl SoftwareCategory {
    pub fn name(&self) -> &'static str {
        match self {
            SoftwareCategory::Browsers => "browsers",
            SoftwareCategory::Office => "office",
            SoftwareCategory::Development => "development",
            SoftwareCategory::Communication => "communication",
            SoftwareCategory::Media => "media",
            SoftwareCategory::Games => "games",
        }
    }
}

impl fmt::Display for SoftwareCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A URL found in the OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlEntity {
    /// The matched text, as it appeared.
    pub url: String,
    #[serde(rename = "type")]
    pub category: UrlCategory,
    pub confidence: f32,
    pub detection_method: DetectionMethod,
}

/// A software product mentioned in the text or recognized on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareEntity {
    pub name: String,
    pub category: SoftwareCategory,
    pub confidence: f32,
    pub detection_method: DetectionMethod,
}

/// Text recognized in an image and the entities found in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text, trimmed.
    pub text: String,
    pub urls: Vec<UrlEntity>,
    pub software: Vec<SoftwareEntity>,
    /// Length of `text` in characters.
    pub text_length: usize,
    /// Share of recognized words that look like real words.
    pub confidence: f32,
}

impl OcrResult {
    /// The result reported when OCR could not run.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Fraction of whitespace-separated words that are purely alphabetic and
/// longer than two characters. Zero for blank text.
pub fn ocr_confidence(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let valid = words
        .iter()
        .filter(|w| w.chars().count() > 2 && w.chars().all(char::is_alphabetic))
        .count();
    (valid as f32 / words.len() as f32).min(1.0)
}

/// Extracts URLs and software from already recognized text.
pub fn extract_entities(
    text: &str,
    image: &RasterImage,
    urls: &UrlExtractor,
    catalog: &Catalog,
    thresholds: &ThresholdConfig,
) -> OcrResult {
    let trimmed = text.trim();
    OcrResult {
        text: trimmed.to_string(),
        urls: urls.extract(text, catalog),
        software: detect_software(text, image, catalog, thresholds.software),
        text_length: trimmed.chars().count(),
        confidence: round3(ocr_confidence(text)),
    }
}
