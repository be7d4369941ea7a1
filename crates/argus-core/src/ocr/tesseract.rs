//! Tesseract command-line engine.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{GrayImage, ImageFormat};

use super::{OcrEngine, OcrError};

/// Runs the `tesseract` binary, piping a PNG through stdin.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    /// Executable to invoke.
    pub binary: String,
    /// Page segmentation mode; 6 = single uniform block of text.
    pub page_segmentation_mode: u8,
    /// Optional language list, e.g. `eng+por`.
    pub language: Option<String>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            page_segmentation_mode: 6,
            language: None,
        }
    }
}

impl TesseractEngine {
    /// Uses a specific tesseract executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string());
        if let Some(ref lang) = self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| OcrError::Encode(e.to_string()))?;

        let mut child = self.command().spawn()?;
        // stdin is dropped before waiting so the engine sees EOF; the child
        // is always reaped, even when it stopped reading early.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(png.get_ref()),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_unavailable() {
        let engine = TesseractEngine::with_binary("/nonexistent/argus-tesseract");
        let err = engine
            .recognize(&GrayImage::new(4, 4))
            .unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn engine_exiting_early_is_reported_as_failure() {
        // Large enough that the PNG does not fit into the pipe buffer.
        let noisy = GrayImage::from_fn(1024, 1024, |x, y| {
            let h = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503);
            image::Luma([(h >> 11) as u8])
        });
        let engine = TesseractEngine::with_binary("false");
        let err = engine.recognize(&noisy).unwrap_err();
        assert!(matches!(err, OcrError::Failed { .. }));
    }

    #[test]
    fn command_uses_single_block_mode() {
        let engine = TesseractEngine::default();
        let cmd = engine.command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["stdin", "stdout", "--psm", "6"]);
    }
}
