//! API request and response models.

use argus_core::features::FeatureVector;
use argus_core::{
    AnalysisMetadata, AnalysisOptions, AnalysisReport, BlurOutcome, DetectorOutcome,
    ExecutiveSummary, FamilyReport, GameResult, NsfwResult, OcrResult,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Extensions accepted for uploads.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Whether `filename` ends in an allowed extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// A parsed multipart upload.
#[derive(Debug, Default)]
pub struct Upload {
    /// `None` when no `image` field was sent.
    pub image: Option<UploadedFile>,
    pub options: AnalysisOptions,
    pub api_key: Option<String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Parses a form flag; anything but `true` (any case) is false.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Response body for GET /v1/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub components: Components,
}

#[derive(Debug, Serialize)]
pub struct Components {
    pub ocr: OcrComponent,
}

#[derive(Debug, Serialize)]
pub struct OcrComponent {
    pub status: &'static str,
    pub engine: &'static str,
}

/// Redaction details with the blurred image inlined as base64 PNG.
#[derive(Debug, Serialize)]
pub struct BlurInfo {
    #[serde(flatten)]
    pub outcome: BlurOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMetadata {
    pub filename: String,
    #[serde(flatten)]
    pub analysis: AnalysisMetadata,
}

/// Response body for POST /v1/analyze.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub nsfw: DetectorOutcome<NsfwResult>,
    pub games: DetectorOutcome<GameResult>,
    pub ocr: DetectorOutcome<OcrResult>,
    pub features: FeatureVector,
    pub blur_info: Option<BlurInfo>,
    pub executive_summary: Option<ExecutiveSummary>,
    pub metadata: ResponseMetadata,
}

impl AnalyzeResponse {
    pub fn new(report: AnalysisReport, filename: String, image_base64: Option<String>) -> Self {
        Self {
            success: true,
            analysis_id: report.analysis_id,
            timestamp: report.timestamp,
            processing_time_ms: report.processing_time_ms,
            nsfw: report.nsfw,
            games: report.games,
            ocr: report.ocr,
            features: report.features,
            blur_info: report.blur_info.map(|outcome| BlurInfo {
                outcome,
                image_base64,
            }),
            executive_summary: report.executive_summary,
            metadata: ResponseMetadata {
                filename,
                analysis: report.metadata,
            },
        }
    }
}

/// Response body for the single-family endpoints.
#[derive(Debug, Serialize)]
pub struct FamilyResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub report: FamilyReport<T>,
}

impl<T> From<FamilyReport<T>> for FamilyResponse<T> {
    fn from(report: FamilyReport<T>) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert!(allowed_file("shot.png"));
        assert!(allowed_file("Shot.JPEG"));
        assert!(allowed_file("archive.tar.webp"));
        assert!(!allowed_file("shot.gif"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn flags() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes"));
    }
}
