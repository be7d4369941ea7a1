//! Process-wide analysis counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters shared by all requests. Every update is a single atomic add,
/// so concurrent requests never lose increments.
#[derive(Debug)]
pub struct Metrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    processing_micros: AtomicU64,
    nsfw_detections: AtomicU64,
    game_detections: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    /// Cumulative processing time in seconds.
    pub processing_time_total: f64,
    pub nsfw_detections: u64,
    pub game_detections: u64,
    pub start_time: DateTime<Utc>,
    pub uptime_seconds: f64,
}

impl MetricsSnapshot {
    /// Mean processing time per request in milliseconds.
    pub fn avg_processing_time_ms(&self) -> f64 {
        if self.requests_total == 0 {
            0.0
        } else {
            self.processing_time_total / self.requests_total as f64 * 1000.0
        }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_error: AtomicU64::new(0),
            processing_micros: AtomicU64::new(0),
            nsfw_detections: AtomicU64::new(0),
            game_detections: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Records one finished request, successful or not.
    pub fn record_request(&self, success: bool, elapsed: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.processing_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn record_nsfw_detection(&self) {
        self.nsfw_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_game_detection(&self) {
        self.game_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            processing_time_total: self.processing_micros.load(Ordering::Relaxed) as f64 / 1e6,
            nsfw_detections: self.nsfw_detections.load(Ordering::Relaxed),
            game_detections: self.game_detections.load(Ordering::Relaxed),
            start_time: self.started_at,
            uptime_seconds: self.uptime().as_secs_f64(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn records_success_and_failure() {
        let metrics = Metrics::new();
        metrics.record_request(true, Duration::from_millis(20));
        metrics.record_request(false, Duration::from_millis(10));
        metrics.record_nsfw_detection();

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 2);
        assert_eq!(snap.requests_success, 1);
        assert_eq!(snap.requests_error, 1);
        assert_eq!(snap.nsfw_detections, 1);
        assert_eq!(snap.game_detections, 0);
        assert!((snap.processing_time_total - 0.03).abs() < 1e-9);
        assert!((snap.avg_processing_time_ms() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(Metrics::new().snapshot().avg_processing_time_ms(), 0.0);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let metrics = Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_request(true, Duration::from_micros(1));
                        metrics.record_game_detection();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 8000);
        assert_eq!(snap.requests_success, 8000);
        assert_eq!(snap.game_detections, 8000);
        assert!((snap.processing_time_total - 0.008).abs() < 1e-9);
    }
}
