//! Keyword and signature tables.
//!
//! Software names, URL category keywords, visual signatures and game titles
//! are plain data. The built-in tables can be replaced at startup from a
//! JSON file without touching detector code.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{SoftwareCategory, UrlCategory};
use crate::error::ConfigError;
use crate::features::color::HsvBand;

/// Keywords that place a URL in a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlCategoryRule {
    pub category: UrlCategory,
    pub keywords: Vec<String>,
}

/// Software names grouped under one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareGroup {
    pub category: SoftwareCategory,
    pub names: Vec<String>,
}

/// A color signature that identifies a product on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSignature {
    pub name: String,
    pub category: SoftwareCategory,
    pub band: HsvBand,
    /// Matching pixel count must exceed this to report the product.
    pub min_pixels: u64,
    pub confidence: f32,
}

/// A known game and the OCR keywords that identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTitle {
    pub name: String,
    pub keywords: Vec<String>,
}

/// All lookup tables used by the detectors. Order matters: the first
/// matching URL rule and the first matching game title win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub url_categories: Vec<UrlCategoryRule>,
    pub software: Vec<SoftwareGroup>,
    pub context_words: Vec<String>,
    pub visual_signatures: Vec<VisualSignature>,
    pub game_titles: Vec<GameTitle>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            url_categories: vec![
                UrlCategoryRule {
                    category: UrlCategory::SocialMedia,
                    keywords: words(&["facebook", "twitter", "instagram", "linkedin"]),
                },
                UrlCategoryRule {
                    category: UrlCategory::Development,
                    keywords: words(&["github", "gitlab", "stackoverflow"]),
                },
                UrlCategoryRule {
                    category: UrlCategory::Video,
                    keywords: words(&["youtube", "vimeo", "twitch"]),
                },
                UrlCategoryRule {
                    category: UrlCategory::News,
                    keywords: words(&["news", "blog", "article"]),
                },
            ],
            software: vec![
                SoftwareGroup {
                    category: SoftwareCategory::Browsers,
                    names: words(&["chrome", "firefox", "safari", "edge", "opera"]),
                },
                SoftwareGroup {
                    category: SoftwareCategory::Office,
                    names: words(&["word", "excel", "powerpoint", "outlook", "teams"]),
                },
                SoftwareGroup {
                    category: SoftwareCategory::Development,
                    names: words(&["vscode", "visual studio", "intellij", "eclipse", "sublime"]),
                },
                SoftwareGroup {
                    category: SoftwareCategory::Communication,
                    names: words(&["slack", "discord", "telegram", "whatsapp", "zoom"]),
                },
                SoftwareGroup {
                    category: SoftwareCategory::Media,
                    names: words(&["photoshop", "illustrator", "premiere", "after effects", "vlc"]),
                },
                SoftwareGroup {
                    category: SoftwareCategory::Games,
                    names: words(&["steam", "epic games", "origin", "uplay", "battle.net"]),
                },
            ],
            context_words: words(&["application", "software", "program", "app"]),
            visual_signatures: vec![
                VisualSignature {
                    name: "Chrome".to_string(),
                    category: SoftwareCategory::Browsers,
                    band: HsvBand::new([100, 100, 100], [120, 255, 255]),
                    min_pixels: 1000,
                    confidence: 0.7,
                },
                VisualSignature {
                    name: "VS Code".to_string(),
                    category: SoftwareCategory::Development,
                    band: HsvBand::new([110, 50, 50], [130, 255, 200]),
                    min_pixels: 500,
                    confidence: 0.6,
                },
            ],
            game_titles: vec![
                GameTitle {
                    name: "league of legends".to_string(),
                    keywords: words(&["league", "lol", "riot", "summoner"]),
                },
                GameTitle {
                    name: "counter-strike".to_string(),
                    keywords: words(&["counter-strike", "cs:go", "csgo"]),
                },
                GameTitle {
                    name: "valorant".to_string(),
                    keywords: words(&["valorant", "spike", "agent"]),
                },
                GameTitle {
                    name: "dota 2".to_string(),
                    keywords: words(&["dota", "steam", "valve"]),
                },
                GameTitle {
                    name: "fortnite".to_string(),
                    keywords: words(&["fortnite", "epic", "battle royale"]),
                },
            ],
        }
    }
}

impl Catalog {
    /// Loads a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            software = catalog.software.iter().map(|g| g.names.len()).sum::<usize>(),
            games = catalog.game_titles.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Parses and normalizes a catalog from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog =
            serde_json::from_str(raw).map_err(|e| ConfigError::Catalog(e.to_string()))?;
        let catalog = catalog.normalized();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Lower-cases every keyword so matching can run on lower-cased text.
    pub fn normalized(mut self) -> Self {
        let lower = |list: &mut Vec<String>| {
            for item in list.iter_mut() {
                *item = item.trim().to_lowercase();
            }
        };
        self.url_categories
            .iter_mut()
            .for_each(|r| lower(&mut r.keywords));
        self.software.iter_mut().for_each(|g| lower(&mut g.names));
        lower(&mut self.context_words);
        self.game_titles
            .iter_mut()
            .for_each(|t| lower(&mut t.keywords));
        self
    }

    /// Rejects empty keywords and out-of-range signature confidences.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let all_keywords = self
            .url_categories
            .iter()
            .flat_map(|r| r.keywords.iter())
            .chain(self.software.iter().flat_map(|g| g.names.iter()))
            .chain(self.context_words.iter())
            .chain(self.game_titles.iter().flat_map(|t| t.keywords.iter()));
        for keyword in all_keywords {
            if keyword.is_empty() {
                return Err(ConfigError::Catalog("empty keyword".to_string()));
            }
        }
        for signature in &self.visual_signatures {
            if !(0.0..=1.0).contains(&signature.confidence) {
                return Err(ConfigError::Catalog(format!(
                    "signature {} has confidence {}",
                    signature.name, signature.confidence
                )));
            }
        }
        Ok(())
    }
}
