//! End-to-end runs of the analyzer over synthetic images.

use std::io::Cursor;
use std::sync::Arc;

use argus_core::ocr::{OcrEngine, OcrError};
use argus_core::{
    AlertCategory, AnalysisError, AnalysisOptions, Analyzer, AnalyzerConfig, BlurLevel, Catalog,
    DetectionMethod, NsfwCategory, RiskStatus, ThresholdConfig, UrlCategory,
};
use image::{GrayImage, ImageFormat, Rgb, RgbImage};

struct FixedText(&'static str);

impl OcrEngine for FixedText {
    fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct Unavailable;

impl OcrEngine for Unavailable {
    fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
        Err(OcrError::Unavailable(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "tesseract not installed",
        )))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

fn analyzer(engine: impl OcrEngine + 'static) -> Analyzer {
    Analyzer::new(
        AnalyzerConfig::default(),
        ThresholdConfig::default(),
        Catalog::default(),
        Arc::new(engine),
    )
}

fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[test]
fn black_image_triggers_nothing() {
    let report = analyzer(FixedText(""))
        .analyze(&png(64, 64, [0, 0, 0]), &AnalysisOptions::default())
        .unwrap();

    assert_eq!(report.features.skin_ratio, 0.0);
    assert_eq!(report.features.edge_density, 0.0);
    assert_eq!(report.features.color_variance, 0.0);

    let nsfw = report.nsfw.result();
    assert!(!nsfw.detected);
    assert_eq!(nsfw.confidence, 0.0);
    assert!(nsfw.scores.values().all(|s| *s == 0.0));
    assert_eq!(nsfw.score(NsfwCategory::Drawing), 0.0);
    assert!(!report.games.result().detected);

    assert!(report.blur_info.is_none());
    let summary = report.executive_summary.unwrap();
    assert_eq!(summary.status, RiskStatus::Normal);
    assert!(summary.alerts.is_empty());
    assert_eq!(summary.recommendations.len(), 3);
}

#[test]
fn failing_ocr_yields_empty_text_without_error() {
    let report = analyzer(Unavailable)
        .analyze(&png(64, 64, [0, 0, 0]), &AnalysisOptions::default())
        .unwrap();

    let ocr = report.ocr.result();
    assert_eq!(ocr.text, "");
    assert!(ocr.urls.is_empty());
    assert!(ocr.software.is_empty());
    assert_eq!(ocr.confidence, 0.0);
    assert!(report.ocr.is_degraded());

    assert_eq!(report.games.result().game_name, "unknown");
    assert!(!report.nsfw.is_degraded());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["ocr"]["error"].as_str().unwrap().contains("tesseract"));
    assert!(json["nsfw"].get("error").is_none());
}

#[test]
fn entities_from_recognized_text() {
    let report = analyzer(FixedText(
        "Slack app open\nhttps://github.com/org/repo and www.youtube.com/watch",
    ))
    .analyze(&png(64, 64, [0, 0, 0]), &AnalysisOptions::default())
    .unwrap();

    let ocr = report.ocr.result();
    assert!(ocr
        .urls
        .iter()
        .any(|u| u.url == "https://github.com/org/repo" && u.category == UrlCategory::Development));
    assert!(ocr
        .urls
        .iter()
        .any(|u| u.url == "www.youtube.com/watch" && u.category == UrlCategory::Video));
    assert!(ocr.urls.iter().all(|u| u.confidence == 0.9));

    let slack = ocr.software.iter().find(|s| s.name == "Slack").unwrap();
    // One mention plus the "app" context word.
    assert_eq!(slack.confidence, 0.4);
    assert_eq!(slack.detection_method, DetectionMethod::Text);

    let summary = report.executive_summary.unwrap();
    assert_eq!(summary.status, RiskStatus::Normal);
    let categories: Vec<_> = summary.alerts.iter().map(|a| a.category).collect();
    assert_eq!(categories, vec![AlertCategory::Urls, AlertCategory::Software]);
    assert!(summary.summary_metrics.text_extracted);
}

#[test]
fn skin_image_is_critical_and_heavily_blurred() {
    let analyzer = analyzer(FixedText(""));
    let report = analyzer
        .analyze(&png(64, 64, [220, 170, 140]), &AnalysisOptions::default())
        .unwrap();

    let nsfw = report.nsfw.result();
    assert!(nsfw.detected);
    assert_eq!(nsfw.category, NsfwCategory::Porn);
    assert_eq!(nsfw.confidence, 1.0);

    let blur = report.blur_info.as_ref().unwrap();
    assert_eq!(blur.level, BlurLevel::Heavy);
    assert_eq!(blur.radius, 15);
    assert!(blur.watermark_text.starts_with("EVIDENCE - HEAVY - "));
    assert!(blur.watermark_rendered);
    assert_eq!(blur.artifact.dimensions(), (64, 64));

    let summary = report.executive_summary.as_ref().unwrap();
    assert_eq!(summary.status, RiskStatus::Critical);
    assert_eq!(summary.alerts[0].category, AlertCategory::Nsfw);

    assert_eq!(analyzer.metrics().snapshot().nsfw_detections, 1);
}

#[test]
fn saturated_blue_screen_is_a_game() {
    let analyzer = analyzer(FixedText("VALORANT"));
    let report = analyzer
        .analyze(&png(64, 64, [0, 0, 255]), &AnalysisOptions::default())
        .unwrap();

    assert!(!report.nsfw.result().detected);
    let games = report.games.result();
    assert!(games.detected);
    assert_eq!(games.game_name, "valorant");
    assert_eq!(games.scores.ui_patterns, 1.0);

    assert_eq!(report.blur_info.as_ref().unwrap().level, BlurLevel::Light);
    let summary = report.executive_summary.as_ref().unwrap();
    assert_eq!(summary.status, RiskStatus::Attention);
    assert_eq!(summary.alerts[0].message, "Gaming activity detected (valorant)");

    // The blue fill also matches the browser color signature.
    assert!(report
        .ocr
        .result()
        .software
        .iter()
        .any(|s| s.name == "Chrome" && s.detection_method == DetectionMethod::Visual));

    assert_eq!(analyzer.metrics().snapshot().game_detections, 1);
}

#[test]
fn repeated_runs_are_identical() {
    let mut image = RgbImage::from_pixel(80, 60, Rgb([20, 120, 40]));
    for x in 20..60 {
        for y in 15..45 {
            image.put_pixel(x, y, Rgb([230, 180, 150]));
        }
    }
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    let bytes = buf.into_inner();

    let analyzer = analyzer(FixedText("steam library"));
    let first = analyzer.analyze(&bytes, &AnalysisOptions::default()).unwrap();
    let second = analyzer.analyze(&bytes, &AnalysisOptions::default()).unwrap();

    assert_eq!(first.nsfw.result(), second.nsfw.result());
    assert_eq!(first.games.result(), second.games.result());
    assert_eq!(first.ocr.result(), second.ocr.result());
    assert_eq!(first.features, second.features);
    assert_ne!(first.analysis_id, second.analysis_id);
}

#[test]
fn undecodable_bytes_fail_the_request() {
    let analyzer = analyzer(FixedText(""));
    let result = analyzer.analyze(b"GIF89a-but-not-really", &AnalysisOptions::default());
    assert!(matches!(result, Err(AnalysisError::Decode(_))));

    let snap = analyzer.metrics().snapshot();
    assert_eq!(snap.requests_total, 1);
    assert_eq!(snap.requests_error, 1);
}

#[test]
fn oversized_payload_is_rejected() {
    let analyzer = Analyzer::new(
        AnalyzerConfig {
            max_image_bytes: 16,
            ..Default::default()
        },
        ThresholdConfig::default(),
        Catalog::default(),
        Arc::new(FixedText("")),
    );
    let result = analyzer.analyze(&png(8, 8, [1, 2, 3]), &AnalysisOptions::default());
    assert!(matches!(result, Err(AnalysisError::ImageTooLarge(_, 16))));
}
