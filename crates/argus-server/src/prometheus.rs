//! Prometheus text exposition of the analysis counters.

use std::fmt::Write;

use argus_core::MetricsSnapshot;

/// Content type of the exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders `snapshot` in Prometheus text format.
pub fn render(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    family(&mut out, "detector_requests_total", "Total number of requests", "counter");
    let _ = writeln!(
        out,
        "detector_requests_total{{status=\"success\"}} {}",
        snapshot.requests_success
    );
    let _ = writeln!(
        out,
        "detector_requests_total{{status=\"error\"}} {}",
        snapshot.requests_error
    );

    family(
        &mut out,
        "detector_processing_duration_seconds",
        "Processing time in seconds",
        "summary",
    );
    let _ = writeln!(
        out,
        "detector_processing_duration_seconds_sum {:.2}",
        snapshot.processing_time_total
    );
    let _ = writeln!(
        out,
        "detector_processing_duration_seconds_count {}",
        snapshot.requests_total
    );

    family(&mut out, "detector_detections_total", "Total detections by type", "counter");
    let _ = writeln!(
        out,
        "detector_detections_total{{type=\"nsfw\"}} {}",
        snapshot.nsfw_detections
    );
    let _ = writeln!(
        out,
        "detector_detections_total{{type=\"games\"}} {}",
        snapshot.game_detections
    );

    family(&mut out, "detector_uptime_seconds", "Uptime in seconds", "gauge");
    let _ = writeln!(
        out,
        "detector_uptime_seconds {}",
        snapshot.uptime_seconds as u64
    );

    family(
        &mut out,
        "detector_avg_processing_time_ms",
        "Average processing time in milliseconds",
        "gauge",
    );
    let _ = writeln!(
        out,
        "detector_avg_processing_time_ms {:.2}",
        snapshot.avg_processing_time_ms()
    );

    out
}

fn family(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn renders_all_families() {
        let snapshot = MetricsSnapshot {
            requests_total: 4,
            requests_success: 3,
            requests_error: 1,
            processing_time_total: 2.0,
            nsfw_detections: 2,
            game_detections: 1,
            start_time: Utc::now(),
            uptime_seconds: 61.7,
        };
        let text = render(&snapshot);

        assert!(text.contains("detector_requests_total{status=\"success\"} 3\n"));
        assert!(text.contains("detector_requests_total{status=\"error\"} 1\n"));
        assert!(text.contains("detector_processing_duration_seconds_sum 2.00\n"));
        assert!(text.contains("detector_processing_duration_seconds_count 4\n"));
        assert!(text.contains("detector_detections_total{type=\"nsfw\"} 2\n"));
        assert!(text.contains("detector_detections_total{type=\"games\"} 1\n"));
        assert!(text.contains("detector_uptime_seconds 61\n"));
        assert!(text.contains("detector_avg_processing_time_ms 500.00\n"));
        assert!(text.contains("# TYPE detector_uptime_seconds gauge\n"));
    }
}
