//! Process-wide configuration.
//!
//! Thresholds are loaded once at startup and shared read-only between all
//! requests. Invalid values are rejected here so that requests never see a
//! broken configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classifier::NsfwCategory;
use crate::error::ConfigError;

/// Environment variable for the porn threshold.
pub const ENV_PORN_THRESHOLD: &str = "ARGUS_NSFW_PORN_THRESHOLD";
/// Environment variable for the hentai threshold.
pub const ENV_HENTAI_THRESHOLD: &str = "ARGUS_NSFW_HENTAI_THRESHOLD";
/// Environment variable for the sexy threshold.
pub const ENV_SEXY_THRESHOLD: &str = "ARGUS_NSFW_SEXY_THRESHOLD";
/// Environment variable for the drawing threshold.
pub const ENV_DRAWING_THRESHOLD: &str = "ARGUS_DRAWING_THRESHOLD";
/// Environment variable for the game detection threshold.
pub const ENV_GAME_THRESHOLD: &str = "ARGUS_GAME_THRESHOLD";
/// Environment variable for the software detection threshold.
pub const ENV_SOFTWARE_THRESHOLD: &str = "ARGUS_SOFTWARE_THRESHOLD";
/// Environment variable for the watermark font path.
pub const ENV_WATERMARK_FONT: &str = "ARGUS_WATERMARK_FONT";

/// Detection thresholds. Every comparison against these is strict
/// (`score > threshold`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub porn: f32,
    pub hentai: f32,
    pub sexy: f32,
    pub drawing: f32,
    pub game: f32,
    pub software: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            porn: 0.5,
            hentai: 0.5,
            sexy: 0.7,
            drawing: 0.6,
            game: 0.3,
            software: 0.25,
        }
    }
}

impl ThresholdConfig {
    /// Loads thresholds from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads thresholds through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str, default: f32| -> Result<f32, ConfigError> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        name: name.to_string(),
                        value: raw.clone(),
                    }),
                None => Ok(default),
            }
        };

        let config = Self {
            porn: read(ENV_PORN_THRESHOLD, defaults.porn)?,
            hentai: read(ENV_HENTAI_THRESHOLD, defaults.hentai)?,
            sexy: read(ENV_SEXY_THRESHOLD, defaults.sexy)?,
            drawing: read(ENV_DRAWING_THRESHOLD, defaults.drawing)?,
            game: read(ENV_GAME_THRESHOLD, defaults.game)?,
            software: read(ENV_SOFTWARE_THRESHOLD, defaults.software)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects non-finite thresholds and thresholds outside [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("porn", self.porn),
            ("hentai", self.hentai),
            ("sexy", self.sexy),
            ("drawing", self.drawing),
            ("game", self.game),
            ("software", self.software),
        ];
        for (name, value) in entries {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Returns the threshold for an NSFW category. `Neutral` can never be
    /// detected, so its threshold is 1.0.
    pub fn for_category(&self, category: NsfwCategory) -> f32 {
        match category {
            NsfwCategory::Porn => self.porn,
            NsfwCategory::Hentai => self.hentai,
            NsfwCategory::Sexy => self.sexy,
            NsfwCategory::Drawing => self.drawing,
            NsfwCategory::Neutral => 1.0,
        }
    }

    /// The NSFW thresholds as a category map, for auditability in results.
    pub fn nsfw_map(&self) -> BTreeMap<NsfwCategory, f32> {
        NsfwCategory::scored()
            .iter()
            .map(|c| (*c, self.for_category(*c)))
            .collect()
    }
}

/// Analyzer settings that are not thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Maximum accepted payload size in bytes (default: 10 MiB).
    pub max_image_bytes: usize,
    /// Run detector families on scoped threads.
    pub parallel: bool,
    /// TrueType font replacing the bundled watermark font.
    pub watermark_font: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 10 * 1024 * 1024,
            parallel: true,
            watermark_font: None,
        }
    }
}

impl AnalyzerConfig {
    /// Default settings with the watermark font taken from the environment.
    pub fn from_env() -> Self {
        Self {
            watermark_font: std::env::var_os(ENV_WATERMARK_FONT).map(PathBuf::from),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ThresholdConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ThresholdConfig::default());
        assert_eq!(config.sexy, 0.7);
        assert_eq!(config.software, 0.25);
    }

    #[test]
    fn overrides_from_lookup() {
        let config =
            ThresholdConfig::from_lookup(lookup(&[(ENV_PORN_THRESHOLD, " 0.35 ")])).unwrap();
        assert_eq!(config.porn, 0.35);
        assert_eq!(config.hentai, 0.5);
    }

    #[test]
    fn rejects_out_of_range() {
        let err = ThresholdConfig::from_lookup(lookup(&[(ENV_GAME_THRESHOLD, "1.5")]));
        assert!(matches!(
            err,
            Err(ConfigError::InvalidThreshold { ref name, .. }) if name == "game"
        ));
    }

    #[test]
    fn rejects_nan_and_garbage() {
        let err = ThresholdConfig::from_lookup(lookup(&[(ENV_SEXY_THRESHOLD, "NaN")]));
        assert!(matches!(err, Err(ConfigError::InvalidThreshold { .. })));

        let err = ThresholdConfig::from_lookup(lookup(&[(ENV_SEXY_THRESHOLD, "high")]));
        assert!(matches!(err, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn category_lookup() {
        let config = ThresholdConfig::default();
        assert_eq!(config.for_category(NsfwCategory::Drawing), 0.6);
        assert_eq!(config.for_category(NsfwCategory::Neutral), 1.0);
        assert_eq!(config.nsfw_map().len(), 4);
    }
}
