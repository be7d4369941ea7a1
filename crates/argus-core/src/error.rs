//! Error types for the analysis pipeline.

use thiserror::Error;

/// Request-level failures. Any of these aborts the whole analysis before a
/// single detector runs.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No bytes were supplied.
    #[error("empty image payload")]
    EmptyInput,

    /// Payload exceeds the configured limit.
    #[error("image too large: {0} bytes (max: {1} bytes)")]
    ImageTooLarge(usize, usize),

    /// Bytes could not be decoded as a raster image.
    #[error("could not decode image: {0}")]
    Decode(String),
}

impl From<image::ImageError> for AnalysisError {
    fn from(e: image::ImageError) -> Self {
        AnalysisError::Decode(e.to_string())
    }
}

/// Failures local to a single detector. These never leave the detector:
/// they are turned into a neutral result carrying a diagnostic.
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    /// The image has no pixels.
    #[error("image has zero area")]
    EmptyImage,

    /// The detector panicked while running.
    #[error("detector panicked: {0}")]
    DetectorPanicked(String),
}

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A threshold lies outside [0, 1] or is not finite.
    #[error("threshold {name} must be within [0, 1], got {value}")]
    InvalidThreshold { name: String, value: f32 },

    /// An environment value could not be parsed.
    #[error("invalid number for {name}: {value:?}")]
    InvalidNumber { name: String, value: String },

    /// Catalog file is malformed.
    #[error("invalid catalog: {0}")]
    Catalog(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
