//! Argus Core - image content analysis.
//!
//! Classifies an uploaded image along three independent axes: explicit
//! content, game activity, and recognizable text (URLs and software
//! mentions). Detected images can be redacted, and all detector outputs are
//! reduced into an executive summary.
//!
//! ## Pipeline
//!
//! ```text
//! bytes → decode → ┬─ NSFW classifier ───────────┐
//!                  ├─ OCR → game classifier ─────┼→ redaction → summary
//!                  └─ OCR → URL / software ──────┘
//! ```
//!
//! Detector families only share the decoded image and the OCR text; a
//! failure in one of them degrades that family to a neutral result and
//! never aborts the others.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use argus_core::{AnalysisOptions, Analyzer, AnalyzerConfig, Catalog, ThresholdConfig};
//! use argus_core::ocr::TesseractEngine;
//!
//! let analyzer = Analyzer::new(
//!     AnalyzerConfig::default(),
//!     ThresholdConfig::from_env().unwrap(),
//!     Catalog::default(),
//!     Arc::new(TesseractEngine::default()),
//! );
//! let bytes = std::fs::read("screenshot.png").unwrap();
//! let report = analyzer.analyze(&bytes, &AnalysisOptions::default()).unwrap();
//! println!("{}", report.nsfw.result().category);
//! ```

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod entities;
pub mod error;
pub mod features;
pub mod metrics;
pub mod ocr;
pub mod pipeline;
pub mod raster;
pub mod redaction;
pub mod summary;

pub use catalog::Catalog;
pub use classifier::{DetectorOutcome, GameResult, NsfwCategory, NsfwResult};
pub use config::{AnalyzerConfig, ThresholdConfig};
pub use entities::{
    DetectionMethod, OcrResult, SoftwareCategory, SoftwareEntity, UrlCategory, UrlEntity,
};
pub use error::{AnalysisError, ConfigError, FeatureError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use pipeline::{AnalysisMetadata, AnalysisOptions, AnalysisReport, Analyzer, FamilyReport};
pub use raster::RasterImage;
pub use redaction::{BlurLevel, BlurOutcome, Redactor};
pub use summary::{Alert, AlertCategory, AlertSeverity, ExecutiveSummary, RiskStatus};

/// Rounds a score to three decimals for reporting.
pub(crate) fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
