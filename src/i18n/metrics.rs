//! Translation metrics and observability module.
//!
//! Counters for lookups, fallbacks, missing keys and backend activity. One
//! instance is owned by each translator and shared with the missing-key
//! writer.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of `t` calls
    lookups: AtomicUsize,

    /// Lookups answered by a resource
    hits: AtomicUsize,

    /// Lookups answered by a fallback language or fallback namespace
    fallbacks: AtomicUsize,

    /// Lookups that found nothing
    misses: AtomicUsize,

    /// Missing keys written to a backend report
    missing_saved: AtomicUsize,

    /// Missing keys discarded because the report queue was full
    missing_dropped: AtomicUsize,

    /// Resource files read by the backend
    backend_reads: AtomicUsize,

    /// Backend reads or writes that failed
    backend_failures: AtomicUsize,

    /// Highest number of backend reads observed in flight at once
    peak_parallel_reads: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a hit; `via_fallback` marks hits outside the requested language or namespace.
    pub fn record_hit(&self, via_fallback: bool) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if via_fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_saved(&self, count: usize) {
        self.missing_saved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_missing_dropped(&self) {
        self.missing_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_read(&self) {
        self.backend_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parallel_reads(&self, in_flight: usize) {
        self.peak_parallel_reads.fetch_max(in_flight, Ordering::Relaxed);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn missing_saved(&self) -> usize {
        self.missing_saved.load(Ordering::Relaxed)
    }

    pub fn missing_dropped(&self) -> usize {
        self.missing_dropped.load(Ordering::Relaxed)
    }

    pub fn backend_reads(&self) -> usize {
        self.backend_reads.load(Ordering::Relaxed)
    }

    pub fn backend_failures(&self) -> usize {
        self.backend_failures.load(Ordering::Relaxed)
    }

    pub fn peak_parallel_reads(&self) -> usize {
        self.peak_parallel_reads.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let lookups = self.lookups();
        let hits = self.hits();
        let hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            lookups,
            hits,
            fallbacks: self.fallbacks(),
            misses: self.misses(),
            hit_rate,
            missing_saved: self.missing_saved(),
            missing_dropped: self.missing_dropped(),
            backend_reads: self.backend_reads(),
            backend_failures: self.backend_failures(),
            peak_parallel_reads: self.peak_parallel_reads(),
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub lookups: usize,
    pub hits: usize,
    pub fallbacks: usize,
    pub misses: usize,

    /// Hit rate as a percentage (0-100)
    pub hit_rate: f64,

    pub missing_saved: usize,
    pub missing_dropped: usize,
    pub backend_reads: usize,
    pub backend_failures: usize,
    pub peak_parallel_reads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = TranslationMetrics::new();
        assert_eq!(metrics.lookups(), 0);
        assert_eq!(metrics.hits(), 0);
        assert_eq!(metrics.misses(), 0);
        assert_eq!(metrics.missing_saved(), 0);
    }

    #[test]
    fn test_record_hit_with_fallback() {
        let metrics = TranslationMetrics::new();
        metrics.record_hit(false);
        metrics.record_hit(true);
        assert_eq!(metrics.hits(), 2);
        assert_eq!(metrics.fallbacks(), 1);
    }

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();
        assert_eq!(report.lookups, 0);
        assert_eq!(report.hit_rate, 0.0);
    }

    #[test]
    fn test_report_hit_rate() {
        let metrics = TranslationMetrics::new();
        for _ in 0..4 {
            metrics.record_lookup();
        }
        for _ in 0..3 {
            metrics.record_hit(false);
        }
        metrics.record_miss();

        let report = metrics.report();
        assert_eq!(report.lookups, 4);
        assert_eq!(report.misses, 1);
        assert!((report.hit_rate - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_backend_read();
        metrics.record_backend_failure();

        metrics.record_parallel_reads(3);
        metrics.record_parallel_reads(2);

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["peak_parallel_reads"], 3);
        assert_eq!(json["backend_reads"], 1);
        assert_eq!(json["backend_failures"], 1);
    }
}
