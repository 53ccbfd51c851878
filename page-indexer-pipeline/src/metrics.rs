//! Ingest counters for operational monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Process-wide ingest counters, shared by the orchestrator, workers and loader.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    received: AtomicU64,
    processed: AtomicU64,
    skipped_malformed: AtomicU64,
    retried: AtomicU64,
    failed_exhausted: AtomicU64,
    failed_rejected: AtomicU64,
    committed: AtomicU64,
}

/// Point-in-time copy of [`IngestMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Messages pulled from the queue, redeliveries included.
    pub received: u64,
    /// Messages whose three writes all succeeded.
    pub processed: u64,
    /// Messages skipped because their payload could not be decoded.
    pub skipped_malformed: u64,
    /// Individual store write retries.
    pub retried: u64,
    /// Messages left unacknowledged after a store exhausted its retries.
    pub failed_exhausted: u64,
    /// Messages acknowledged although a store permanently refused a record.
    pub failed_rejected: u64,
    /// Offset commits issued.
    pub committed: u64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_malformed(&self) {
        self.skipped_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_exhausted(&self) {
        self.failed_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_rejected(&self) {
        self.failed_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            skipped_malformed: self.skipped_malformed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            failed_exhausted: self.failed_exhausted.load(Ordering::Relaxed),
            failed_rejected: self.failed_rejected.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
        }
    }

    /// Emit the current counters as one structured log line.
    pub fn log_snapshot(&self) {
        let s = self.snapshot();
        info!(
            received = s.received,
            processed = s.processed,
            skipped_malformed = s.skipped_malformed,
            retried = s.retried,
            failed_exhausted = s.failed_exhausted,
            failed_rejected = s.failed_rejected,
            committed = s.committed,
            "Ingest metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = IngestMetrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.record_processed();
        metrics.record_skipped_malformed();
        metrics.record_retry();
        metrics.record_retry();
        metrics.record_retry();

        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.skipped_malformed, 1);
        assert_eq!(snapshot.retried, 3);
        assert_eq!(snapshot.failed_exhausted, 0);
    }
}
