//! The analysis pipeline.
//!
//! [`Analyzer`] decodes one image, runs the detector families over it, then
//! redacts and summarizes. Detector families only share the decoded image
//! and the OCR text, so they run on scoped threads when parallelism is
//! enabled. Redaction and the summary wait for all of them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::classifier::{game, nsfw, DetectorOutcome, GameResult, NsfwResult};
use crate::config::{AnalyzerConfig, ThresholdConfig};
use crate::entities::{extract_entities, OcrResult, UrlExtractor};
use crate::error::{AnalysisError, FeatureError};
use crate::features::{FeatureVector, GameSignals, NsfwSignals};
use crate::metrics::Metrics;
use crate::ocr::{extract_text, OcrEngine, TextExtraction};
use crate::raster::RasterImage;
use crate::redaction::{select_blur_level, BlurOutcome, Redactor};
use crate::summary::{build_summary, ExecutiveSummary};

/// A classifier outcome plus the signals it was computed from, if any.
type NsfwRun = (DetectorOutcome<NsfwResult>, Option<NsfwSignals>);
type GameRun = (DetectorOutcome<GameResult>, Option<GameSignals>);

/// Per-request flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Produce a redacted copy when something is detected.
    pub blur_enabled: bool,
    pub include_summary: bool,
    /// Echoed in the report metadata; does not change any formula.
    pub sensitivity_level: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            blur_enabled: true,
            include_summary: true,
            sensitivity_level: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub sensitivity_level: String,
    pub blur_enabled: bool,
    pub width: u32,
    pub height: u32,
}

/// Everything produced by one full analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub nsfw: DetectorOutcome<NsfwResult>,
    pub games: DetectorOutcome<GameResult>,
    pub ocr: DetectorOutcome<OcrResult>,
    pub features: FeatureVector,
    pub blur_info: Option<BlurOutcome>,
    pub executive_summary: Option<ExecutiveSummary>,
    pub metadata: AnalysisMetadata,
}

/// Result of running a single detector family.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyReport<T> {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub result: DetectorOutcome<T>,
}

/// Runs the detectors over uploaded images.
///
/// Thresholds and catalog are fixed at construction; the analyzer is
/// shared by reference between concurrent requests.
pub struct Analyzer {
    config: AnalyzerConfig,
    thresholds: Arc<ThresholdConfig>,
    catalog: Arc<Catalog>,
    ocr: Arc<dyn OcrEngine>,
    urls: UrlExtractor,
    redactor: Redactor,
    metrics: Arc<Metrics>,
}

impl Analyzer {
    pub fn new(
        config: AnalyzerConfig,
        thresholds: ThresholdConfig,
        catalog: Catalog,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let redactor = Redactor::from_font_path(config.watermark_font.as_deref());
        Self {
            config,
            thresholds: Arc::new(thresholds),
            catalog: Arc::new(catalog),
            ocr,
            urls: UrlExtractor::new(),
            redactor,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn ocr_engine_name(&self) -> &'static str {
        self.ocr.name()
    }

    /// Runs every detector family, then redaction and the summary.
    ///
    /// Only decoding can fail the request. Detector failures surface as
    /// degraded outcomes inside the report.
    pub fn analyze(
        &self,
        data: &[u8],
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError> {
        let started = Instant::now();
        let image = self.decode(data, started)?;

        let ((nsfw, nsfw_signals), (games, game_signals), ocr) = if self.config.parallel {
            self.run_families_parallel(&image)
        } else {
            let nsfw_run = self.run_nsfw(&image);
            let extraction = self.run_ocr(&image);
            let games_run = self.run_games(&image, &extraction.text);
            (nsfw_run, games_run, self.run_entities(&image, &extraction))
        };

        let now = Utc::now();
        let blur_info = if options.blur_enabled {
            self.redact(&image, nsfw.result(), games.result(), now)
        } else {
            None
        };

        let executive_summary = options
            .include_summary
            .then(|| build_summary(nsfw.result(), games.result(), ocr.result()));

        self.record_detections(Some(nsfw.result()), Some(games.result()));
        let elapsed = started.elapsed();
        self.metrics.record_request(true, elapsed);

        let report = AnalysisReport {
            analysis_id: analysis_id(now),
            timestamp: now,
            processing_time_ms: millis(elapsed),
            features: FeatureVector::from_parts(nsfw_signals.as_ref(), game_signals.as_ref()),
            nsfw,
            games,
            ocr,
            blur_info,
            executive_summary,
            metadata: AnalysisMetadata {
                sensitivity_level: options.sensitivity_level.clone(),
                blur_enabled: options.blur_enabled,
                width: image.width(),
                height: image.height(),
            },
        };

        info!(
            id = %report.analysis_id,
            nsfw = report.nsfw.result().detected,
            category = %report.nsfw.result().category,
            games = report.games.result().detected,
            urls = report.ocr.result().urls.len(),
            software = report.ocr.result().software.len(),
            blurred = report.blur_info.is_some(),
            elapsed_ms = report.processing_time_ms,
            "analysis complete"
        );

        Ok(report)
    }

    /// Runs only the NSFW classifier.
    pub fn analyze_nsfw(&self, data: &[u8]) -> Result<FamilyReport<NsfwResult>, AnalysisError> {
        self.single_family(data, |image| {
            let (outcome, _) = self.run_nsfw(image);
            self.record_detections(Some(outcome.result()), None);
            outcome
        })
    }

    /// Runs OCR and the game classifier.
    pub fn analyze_games(&self, data: &[u8]) -> Result<FamilyReport<GameResult>, AnalysisError> {
        self.single_family(data, |image| {
            let extraction = self.run_ocr(image);
            let (outcome, _) = self.run_games(image, &extraction.text);
            self.record_detections(None, Some(outcome.result()));
            outcome
        })
    }

    /// Runs OCR and entity extraction.
    pub fn analyze_text(&self, data: &[u8]) -> Result<FamilyReport<OcrResult>, AnalysisError> {
        self.single_family(data, |image| {
            let extraction = self.run_ocr(image);
            self.run_entities(image, &extraction)
        })
    }

    fn single_family<T>(
        &self,
        data: &[u8],
        run: impl FnOnce(&RasterImage) -> DetectorOutcome<T>,
    ) -> Result<FamilyReport<T>, AnalysisError> {
        let started = Instant::now();
        let image = self.decode(data, started)?;
        let result = run(&image);
        let elapsed = started.elapsed();
        self.metrics.record_request(true, elapsed);

        let now = Utc::now();
        Ok(FamilyReport {
            analysis_id: analysis_id(now),
            timestamp: now,
            processing_time_ms: millis(elapsed),
            result,
        })
    }

    fn decode(&self, data: &[u8], started: Instant) -> Result<RasterImage, AnalysisError> {
        RasterImage::decode(data, self.config.max_image_bytes).map_err(|e| {
            warn!(error = %e, bytes = data.len(), "rejecting image");
            self.metrics.record_request(false, started.elapsed());
            e
        })
    }

    /// NSFW and OCR start together; once the text is known, the game
    /// classifier and entity extraction run side by side.
    fn run_families_parallel(
        &self,
        image: &RasterImage,
    ) -> (NsfwRun, GameRun, DetectorOutcome<OcrResult>) {
        let (nsfw_run, extraction) = thread::scope(|scope| {
            let handle = scope.spawn(|| self.run_nsfw(image));
            let extraction = self.run_ocr(image);
            let nsfw_run = handle
                .join()
                .unwrap_or_else(|payload| (degraded_nsfw(panicked(payload.as_ref())), None));
            (nsfw_run, extraction)
        });

        let (games_run, ocr) = thread::scope(|scope| {
            let handle = scope.spawn(|| self.run_games(image, &extraction.text));
            let ocr = self.run_entities(image, &extraction);
            let games_run = handle
                .join()
                .unwrap_or_else(|payload| (self.degraded_games(panicked(payload.as_ref())), None));
            (games_run, ocr)
        });

        (nsfw_run, games_run, ocr)
    }

    fn run_nsfw(&self, image: &RasterImage) -> NsfwRun {
        match guarded(|| NsfwSignals::extract(image)) {
            Ok(signals) => (
                DetectorOutcome::Completed(nsfw::classify(&signals, &self.thresholds)),
                Some(signals),
            ),
            Err(e) => {
                warn!(error = %e, "NSFW detector degraded");
                (degraded_nsfw(e), None)
            }
        }
    }

    fn run_ocr(&self, image: &RasterImage) -> TextExtraction {
        guarded(|| Ok(extract_text(self.ocr.as_ref(), image))).unwrap_or_else(|e| {
            warn!(error = %e, "OCR degraded");
            TextExtraction {
                text: String::new(),
                error: Some(e.to_string()),
            }
        })
    }

    fn run_games(&self, image: &RasterImage, text: &str) -> GameRun {
        match guarded(|| GameSignals::extract(image, text)) {
            Ok(signals) => {
                let result =
                    game::classify(&signals, text, &self.catalog.game_titles, &self.thresholds);
                (DetectorOutcome::Completed(result), Some(signals))
            }
            Err(e) => {
                warn!(error = %e, "game detector degraded");
                (self.degraded_games(e), None)
            }
        }
    }

    fn run_entities(
        &self,
        image: &RasterImage,
        extraction: &TextExtraction,
    ) -> DetectorOutcome<OcrResult> {
        if let Some(reason) = &extraction.error {
            return DetectorOutcome::degraded(OcrResult::empty(), reason.clone());
        }
        match guarded(|| {
            Ok(extract_entities(
                &extraction.text,
                image,
                &self.urls,
                &self.catalog,
                &self.thresholds,
            ))
        }) {
            Ok(result) => DetectorOutcome::Completed(result),
            Err(e) => {
                warn!(error = %e, "entity extraction degraded");
                DetectorOutcome::degraded(OcrResult::empty(), e.to_string())
            }
        }
    }

    fn degraded_games(&self, e: FeatureError) -> DetectorOutcome<GameResult> {
        DetectorOutcome::degraded(GameResult::not_detected(self.thresholds.game), e.to_string())
    }

    fn redact(
        &self,
        image: &RasterImage,
        nsfw: &NsfwResult,
        games: &GameResult,
        at: DateTime<Utc>,
    ) -> Option<BlurOutcome> {
        let level = select_blur_level(nsfw.detected, nsfw.category, games.detected)?;
        match guarded(|| Ok(self.redactor.redact(image.rgb(), level, at))) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, %level, "redaction failed, returning report without it");
                None
            }
        }
    }

    fn record_detections(&self, nsfw: Option<&NsfwResult>, games: Option<&GameResult>) {
        if nsfw.is_some_and(|r| r.detected) {
            self.metrics.record_nsfw_detection();
        }
        if games.is_some_and(|r| r.detected) {
            self.metrics.record_game_detection();
        }
    }
}

fn degraded_nsfw(e: FeatureError) -> DetectorOutcome<NsfwResult> {
    DetectorOutcome::degraded(NsfwResult::neutral(), e.to_string())
}

/// Runs `f`, turning a panic into [`FeatureError::DetectorPanicked`].
fn guarded<T>(f: impl FnOnce() -> Result<T, FeatureError>) -> Result<T, FeatureError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(panicked(payload.as_ref())))
}

fn panicked(payload: &(dyn Any + Send)) -> FeatureError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    FeatureError::DetectorPanicked(message)
}

/// `ana_<unix seconds><8 hex chars>`.
fn analysis_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ana_{}{}", now.timestamp(), &suffix[..8])
}

fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrError;
    use image::{GrayImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    struct Fixed(&'static str);

    impl OcrEngine for Fixed {
        fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Panicking;

    impl OcrEngine for Panicking {
        fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            panic!("engine crashed")
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn png(image: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn analyzer(engine: Arc<dyn OcrEngine>, parallel: bool) -> Analyzer {
        Analyzer::new(
            AnalyzerConfig {
                parallel,
                ..Default::default()
            },
            ThresholdConfig::default(),
            Catalog::default(),
            engine,
        )
    }

    #[test]
    fn analysis_id_shape() {
        let now = Utc::now();
        let id = analysis_id(now);
        let prefix = format!("ana_{}", now.timestamp());
        assert!(id.starts_with(&prefix));
        let suffix = &id[prefix.len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn millis_rounds_to_two_decimals() {
        assert_eq!(millis(Duration::from_micros(12_345)), 12.35);
    }

    #[test]
    fn panicking_ocr_degrades_only_text() {
        let bytes = png(&RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])));
        for parallel in [true, false] {
            let report = analyzer(Arc::new(Panicking), parallel)
                .analyze(&bytes, &AnalysisOptions::default())
                .unwrap();
            assert!(report.ocr.is_degraded());
            assert!(report.ocr.diagnostic().unwrap().contains("engine crashed"));
            assert!(!report.nsfw.is_degraded());
            assert!(!report.games.is_degraded());
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let mut image = RgbImage::from_pixel(64, 64, Rgb([30, 60, 200]));
        for x in 10..40 {
            for y in 10..40 {
                image.put_pixel(x, y, Rgb([220, 170, 140]));
            }
        }
        let bytes = png(&image);
        let engine: Arc<dyn OcrEngine> = Arc::new(Fixed("steam library www.twitch.tv"));
        let a = analyzer(Arc::clone(&engine), true)
            .analyze(&bytes, &AnalysisOptions::default())
            .unwrap();
        let b = analyzer(engine, false)
            .analyze(&bytes, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(a.nsfw.result(), b.nsfw.result());
        assert_eq!(a.games.result(), b.games.result());
        assert_eq!(a.ocr.result(), b.ocr.result());
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn summary_and_blur_follow_options() {
        let bytes = png(&RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])));
        let options = AnalysisOptions {
            blur_enabled: false,
            include_summary: false,
            sensitivity_level: "high".to_string(),
        };
        let report = analyzer(Arc::new(Fixed("")), true)
            .analyze(&bytes, &options)
            .unwrap();
        assert!(report.blur_info.is_none());
        assert!(report.executive_summary.is_none());
        assert_eq!(report.metadata.sensitivity_level, "high");
        assert_eq!((report.metadata.width, report.metadata.height), (32, 32));
    }

    #[test]
    fn decode_failure_is_counted() {
        let analyzer = analyzer(Arc::new(Fixed("")), true);
        let err = analyzer.analyze(b"definitely not an image", &AnalysisOptions::default());
        assert!(matches!(err, Err(AnalysisError::Decode(_))));
        assert!(matches!(analyzer.analyze_nsfw(&[]), Err(AnalysisError::EmptyInput)));

        let snap = analyzer.metrics().snapshot();
        assert_eq!(snap.requests_total, 2);
        assert_eq!(snap.requests_error, 2);
    }

    #[test]
    fn single_families_record_requests() {
        let analyzer = analyzer(Arc::new(Fixed("visit github.com")), true);
        let bytes = png(&RgbImage::from_pixel(16, 16, Rgb([255, 255, 255])));

        let nsfw = analyzer.analyze_nsfw(&bytes).unwrap();
        assert!(nsfw.analysis_id.starts_with("ana_"));
        let games = analyzer.analyze_games(&bytes).unwrap();
        assert_eq!(games.result.result().game_name, "unknown");
        let text = analyzer.analyze_text(&bytes).unwrap();
        assert_eq!(text.result.result().urls[0].url, "github.com");

        assert_eq!(analyzer.metrics().snapshot().requests_success, 3);
    }
}
