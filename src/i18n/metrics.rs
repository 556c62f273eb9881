//! Cache metrics for locale lookups and translation loading.
//!
//! Each `LocaleRegistry` and `TranslationStore` owns its own counters so that
//! independent instances (and tests) do not interfere with each other.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for cache behaviour.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Number of times data was served from a cache
    cache_hits: AtomicUsize,

    /// Number of times a cache lookup missed
    cache_misses: AtomicUsize,

    /// Number of times data was (re)loaded from storage
    reloads: AtomicUsize,
}

/// Point-in-time snapshot of `CacheMetrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_hit_rate: f64,
    pub reloads: usize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            reloads: self.reloads(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.reloads.store(0, Ordering::Relaxed);
    }
}

impl MetricsReport {
    /// Format the report as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "Cache: {} hits, {} misses ({:.1}% hit rate), {} reloads",
            self.cache_hits, self.cache_misses, self.cache_hit_rate, self.reloads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = CacheMetrics::new();
        let report = metrics.report();
        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.cache_misses, 0);
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.reloads, 0);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let metrics = CacheMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let report = metrics.report();
        assert_eq!(report.cache_hit_rate, 75.0);
    }

    #[test]
    fn test_reset() {
        let metrics = CacheMetrics::new();
        metrics.record_cache_hit();
        metrics.record_reload();
        metrics.reset();
        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.reloads(), 0);
    }

    #[test]
    fn test_report_format() {
        let metrics = CacheMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_reload();

        let formatted = metrics.report().format();
        assert_eq!(formatted, "Cache: 1 hits, 1 misses (50.0% hit rate), 1 reloads");
    }

    #[test]
    fn test_report_serializes() {
        let metrics = CacheMetrics::new();
        metrics.record_reload();
        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["reloads"], 1);
    }
}
