//! Metrics collection module
//!
//! Tracks scrape outcomes, capture durations, and search usage.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Number of capture durations kept for the rolling average
const DURATION_WINDOW: usize = 100;

/// In-process metrics collector, shared behind an `Arc`
pub struct Metrics {
    /// Total scrape requests accepted
    pub total_scrapes: AtomicU64,
    /// Captures that produced page content
    successes: AtomicU64,
    /// Capture failures by error kind
    failures: RwLock<BTreeMap<String, u64>>,
    /// Documents the search engine refused or never received
    indexing_failures: AtomicU64,
    /// Total search requests
    searches: AtomicU64,
    /// Last capture durations in ms
    durations: RwLock<VecDeque<u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_scrapes: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: RwLock::new(BTreeMap::new()),
            indexing_failures: AtomicU64::new(0),
            searches: AtomicU64::new(0),
            durations: RwLock::new(VecDeque::with_capacity(DURATION_WINDOW)),
        }
    }

    /// Increment total scrape count
    pub fn inc_scrape(&self) {
        self.total_scrapes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a capture that produced page content
    pub fn record_success(&self, duration_ms: u64) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.record_duration(duration_ms);
    }

    /// Record a capture that ended in an error document
    pub fn record_failure(&self, kind: &str, duration_ms: u64) {
        {
            let mut failures = self.failures.write().unwrap_or_else(|e| e.into_inner());
            *failures.entry(kind.to_string()).or_insert(0) += 1;
        }
        self.record_duration(duration_ms);
    }

    pub fn record_indexing_failure(&self) {
        self.indexing_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, duration_ms: u64) {
        let mut durations = self.durations.write().unwrap_or_else(|e| e.into_inner());
        if durations.len() >= DURATION_WINDOW {
            durations.pop_front();
        }
        durations.push_back(duration_ms);
    }

    /// Get total scrapes
    pub fn get_total_scrapes(&self) -> u64 {
        self.total_scrapes.load(Ordering::Relaxed)
    }

    /// Average capture duration over the rolling window
    pub fn get_avg_duration(&self) -> Option<u64> {
        let durations = self.durations.read().unwrap_or_else(|e| e.into_inner());
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<u64>() / durations.len() as u64)
        }
    }

    /// Share of captures that produced content, in percent
    pub fn get_success_rate(&self) -> f64 {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures: u64 = self
            .failures
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum();

        let total = successes + failures;
        if total == 0 {
            100.0
        } else {
            (successes as f64 / total as f64) * 100.0
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_scrapes: self.get_total_scrapes(),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self
                .failures
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            indexing_failures: self.indexing_failures.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
            avg_duration_ms: self.get_avg_duration(),
            success_rate: self.get_success_rate(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics view served on `/stats`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_scrapes: u64,
    pub successes: u64,
    pub failures: BTreeMap<String, u64>,
    pub indexing_failures: u64,
    pub searches: u64,
    pub avg_duration_ms: Option<u64>,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_scrape();
        metrics.inc_scrape();
        metrics.record_success(100);
        metrics.record_failure("timeout", 300);
        metrics.record_indexing_failure();
        metrics.inc_search();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_scrapes, 2);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures.get("timeout"), Some(&1));
        assert_eq!(snapshot.indexing_failures, 1);
        assert_eq!(snapshot.searches, 1);
        assert_eq!(snapshot.avg_duration_ms, Some(200));
        assert_eq!(snapshot.success_rate, 50.0);
    }

    #[test]
    fn test_duration_window_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..DURATION_WINDOW {
            metrics.record_success(1000);
        }
        for _ in 0..DURATION_WINDOW {
            metrics.record_success(10);
        }
        assert_eq!(metrics.get_avg_duration(), Some(10));
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = Metrics::default();
        assert_eq!(metrics.get_avg_duration(), None);
        assert_eq!(metrics.get_success_rate(), 100.0);

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["total_scrapes"], 0);
        assert!(json["avg_duration_ms"].is_null());
    }
}
