//! Text extraction front-end.
//!
//! The recognition itself is delegated to a pluggable [`OcrEngine`]. This
//! module owns the image cleanup that runs before recognition.

mod preprocess;
mod tesseract;

use image::GrayImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::raster::RasterImage;

pub use preprocess::preprocess_for_ocr;
pub use tesseract::TesseractEngine;

/// OCR engine failures. Callers treat all of them as "no text".
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be started.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The engine ran but reported failure.
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The image could not be handed to the engine.
    #[error("could not encode image for OCR: {0}")]
    Encode(String),
}

/// A text recognition engine operating on a cleaned binary image.
pub trait OcrEngine: Send + Sync {
    /// Recognizes the text of `image`, treated as a single uniform block.
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;

    /// Returns the name of this engine for logging and health reporting.
    fn name(&self) -> &'static str;
}

/// Outcome of running OCR once for a request.
#[derive(Debug, Clone, Default)]
pub struct TextExtraction {
    /// Raw recognized text, empty on failure.
    pub text: String,
    /// Why recognition failed, if it did.
    pub error: Option<String>,
}

impl TextExtraction {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Pre-processes `image` and runs `engine` on it. Engine failures are
/// absorbed into an empty extraction.
pub fn extract_text(engine: &dyn OcrEngine, image: &RasterImage) -> TextExtraction {
    let cleaned = preprocess_for_ocr(image.gray());
    match engine.recognize(&cleaned) {
        Ok(text) => {
            debug!(engine = engine.name(), chars = text.len(), "OCR complete");
            TextExtraction { text, error: None }
        }
        Err(e) => {
            warn!(engine = engine.name(), error = %e, "OCR failed, continuing without text");
            TextExtraction {
                text: String::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
