//! Executive summary over all detector outputs.

use serde::{Deserialize, Serialize};

use crate::classifier::{GameResult, NsfwResult};
use crate::entities::OcrResult;

/// Overall risk of an analyzed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Normal,
    Attention,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Attention,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Nsfw,
    Games,
    Urls,
    Software,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub message: String,
    pub action: String,
}

impl Alert {
    fn new(
        severity: AlertSeverity,
        category: AlertCategory,
        message: String,
        action: &str,
    ) -> Self {
        Self {
            severity,
            category,
            message,
            action: action.to_string(),
        }
    }
}

/// Headline numbers repeated from the detector results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub nsfw_confidence: f32,
    pub game_confidence: f32,
    pub text_extracted: bool,
    pub urls_found: usize,
    pub software_found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub status: RiskStatus,
    /// NSFW first, then games, URLs and software.
    pub alerts: Vec<Alert>,
    pub summary_metrics: SummaryMetrics,
    pub recommendations: Vec<String>,
}

/// Reduces the three detector results into a summary.
pub fn build_summary(nsfw: &NsfwResult, games: &GameResult, ocr: &OcrResult) -> ExecutiveSummary {
    let mut status = RiskStatus::Normal;
    let mut alerts = Vec::new();

    if nsfw.detected {
        if nsfw.category.is_explicit() {
            status = RiskStatus::Critical;
            alerts.push(Alert::new(
                AlertSeverity::Critical,
                AlertCategory::Nsfw,
                format!(
                    "{} content detected with {:.1}% confidence",
                    nsfw.category,
                    nsfw.confidence * 100.0
                ),
                "Immediate action required",
            ));
        } else {
            status = RiskStatus::Attention;
            alerts.push(Alert::new(
                AlertSeverity::Attention,
                AlertCategory::Nsfw,
                format!("{} content detected", nsfw.category),
                "Review content",
            ));
        }
    }

    if games.detected {
        if status == RiskStatus::Normal {
            status = RiskStatus::Attention;
        }
        alerts.push(Alert::new(
            AlertSeverity::Attention,
            AlertCategory::Games,
            format!("Gaming activity detected ({})", games.game_name),
            "Verify whether this is an appropriate time",
        ));
    }

    if !ocr.urls.is_empty() {
        alerts.push(Alert::new(
            AlertSeverity::Info,
            AlertCategory::Urls,
            format!("{} URL(s) detected", ocr.urls.len()),
            "Verify whether work related",
        ));
    }

    if !ocr.software.is_empty() {
        alerts.push(Alert::new(
            AlertSeverity::Info,
            AlertCategory::Software,
            format!("{} software item(s) detected", ocr.software.len()),
            "Verify appropriate use",
        ));
    }

    ExecutiveSummary {
        status,
        alerts,
        summary_metrics: SummaryMetrics {
            nsfw_confidence: nsfw.confidence,
            game_confidence: games.confidence,
            text_extracted: !ocr.text.is_empty(),
            urls_found: ocr.urls.len(),
            software_found: ocr.software.len(),
        },
        recommendations: recommendations(status),
    }
}

/// The fixed recommendation list for a status.
pub fn recommendations(status: RiskStatus) -> Vec<String> {
    let items: [&str; 3] = match status {
        RiskStatus::Critical => [
            "Disciplinary action may be required",
            "Document evidence for HR",
            "Review acceptable use policies",
        ],
        RiskStatus::Attention => [
            "Talk with the employee about appropriate use",
            "Consider additional training",
            "Monitor future activity",
        ],
        RiskStatus::Normal => [
            "Continue regular monitoring",
            "No immediate action required",
            "Keep acceptable use policies up to date",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::NsfwCategory;
    use crate::entities::{DetectionMethod, SoftwareCategory, SoftwareEntity};

    fn nsfw(detected: bool, category: NsfwCategory, confidence: f32) -> NsfwResult {
        NsfwResult {
            detected,
            confidence,
            category,
            ..NsfwResult::neutral()
        }
    }

    fn game(detected: bool) -> GameResult {
        GameResult {
            detected,
            game_name: "valorant".to_string(),
            ..GameResult::not_detected(0.3)
        }
    }

    #[test]
    fn porn_is_critical() {
        let summary = build_summary(
            &nsfw(true, NsfwCategory::Porn, 0.8),
            &game(true),
            &OcrResult::empty(),
        );
        assert_eq!(summary.status, RiskStatus::Critical);
        assert_eq!(summary.alerts[0].category, AlertCategory::Nsfw);
        assert_eq!(summary.alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(
            summary.alerts[0].message,
            "porn content detected with 80.0% confidence"
        );
        assert_eq!(summary.alerts[1].category, AlertCategory::Games);
        assert_eq!(summary.recommendations, recommendations(RiskStatus::Critical));
        assert_eq!(summary.recommendations.len(), 3);
    }

    #[test]
    fn game_only_needs_attention() {
        let summary = build_summary(
            &nsfw(false, NsfwCategory::Porn, 0.1),
            &game(true),
            &OcrResult::empty(),
        );
        assert_eq!(summary.status, RiskStatus::Attention);
        assert_eq!(summary.alerts.len(), 1);
        assert_eq!(summary.alerts[0].message, "Gaming activity detected (valorant)");
    }

    #[test]
    fn sexy_needs_attention() {
        let summary = build_summary(
            &nsfw(true, NsfwCategory::Sexy, 0.9),
            &game(false),
            &OcrResult::empty(),
        );
        assert_eq!(summary.status, RiskStatus::Attention);
        assert_eq!(summary.alerts[0].message, "sexy content detected");
    }

    #[test]
    fn entities_add_info_alerts_only() {
        let ocr = OcrResult {
            text: "slack".to_string(),
            software: vec![SoftwareEntity {
                name: "Slack".to_string(),
                category: SoftwareCategory::Communication,
                confidence: 0.3,
                detection_method: DetectionMethod::Text,
            }],
            ..OcrResult::empty()
        };
        let summary = build_summary(&nsfw(false, NsfwCategory::Porn, 0.0), &game(false), &ocr);
        assert_eq!(summary.status, RiskStatus::Normal);
        assert_eq!(summary.alerts.len(), 1);
        assert_eq!(summary.alerts[0].severity, AlertSeverity::Info);
        assert_eq!(summary.alerts[0].message, "1 software item(s) detected");
        assert!(summary.summary_metrics.text_extracted);
        assert_eq!(summary.summary_metrics.software_found, 1);
        assert_eq!(summary.recommendations.len(), 3);
    }

    #[test]
    fn serializes_lowercase() {
        let summary = build_summary(
            &nsfw(true, NsfwCategory::Hentai, 0.6),
            &game(false),
            &OcrResult::empty(),
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "critical");
        assert_eq!(json["alerts"][0]["type"], "critical");
        assert_eq!(json["alerts"][0]["category"], "nsfw");
    }
}
