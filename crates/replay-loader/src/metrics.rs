//! Fetch counters for a loader.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Thread-safe request counters, shared by every lane of a loader.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    /// Replay record requests (one per load cycle).
    pub record_requests: AtomicU64,
    /// Error event pages fetched.
    pub error_pages: AtomicU64,
    /// Error event page requests that failed and ended the errors lane.
    pub error_page_failures: AtomicU64,
    /// Recording segment pages fetched.
    pub segment_pages: AtomicU64,
    /// Recording segment pages that failed and were skipped.
    pub segment_page_failures: AtomicU64,
}

impl FetchMetrics {
    pub fn record_record_request(&self) {
        self.record_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error_page(&self) {
        self.error_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error_page_failure(&self) {
        self.error_page_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_segment_page(&self) {
        self.segment_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_segment_page_failure(&self) {
        self.segment_page_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            record_requests: self.record_requests.load(Ordering::Relaxed),
            error_pages: self.error_pages.load(Ordering::Relaxed),
            error_page_failures: self.error_page_failures.load(Ordering::Relaxed),
            segment_pages: self.segment_pages.load(Ordering::Relaxed),
            segment_page_failures: self.segment_page_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FetchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub record_requests: u64,
    pub error_pages: u64,
    pub error_page_failures: u64,
    pub segment_pages: u64,
    pub segment_page_failures: u64,
}

impl MetricsSnapshot {
    /// Every request issued, failed ones included.
    pub fn total_requests(&self) -> u64 {
        self.record_requests
            + self.error_pages
            + self.error_page_failures
            + self.segment_pages
            + self.segment_page_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_requests_counts_failures() {
        let metrics = FetchMetrics::default();
        metrics.record_record_request();
        metrics.record_error_page();
        metrics.record_error_page_failure();
        metrics.record_segment_page();
        metrics.record_segment_page();
        metrics.record_segment_page_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.error_pages, 1);
        assert_eq!(snapshot.error_page_failures, 1);
        assert_eq!(snapshot.segment_page_failures, 1);
        assert_eq!(snapshot.total_requests(), 6);
    }
}
