//! Metrics registry for QuorumDB
//!
//! Counters only, monotonic increase, reset only on process start.
//! Thread-safe but lock-minimal: every counter is an atomic and the
//! registry is shared by reference across worker threads.

use std::sync::atomic::{AtomicU64, Ordering};

/// The closed set of counters a node records during a run.
///
/// Worker threads record through `MetricsRegistry::record`; the counter
/// identity travels as this enum rather than a string so misspelled
/// counters cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Messages encoded to wire form
    MsgsEncoded,
    /// Messages decoded from wire form
    MsgsDecoded,
    /// Batches packed for transport
    BatchesPacked,
    /// Batches unpacked from transport
    BatchesUnpacked,
    /// Row read admissions
    RowReads,
    /// Row prewrite admissions
    RowPrewrites,
    /// Commit validations that succeeded
    TxnCommits,
    /// Commit validations that signalled abort
    TxnAborts,
    /// Explicit releases (abort cleanup paths)
    TxnReleases,
    /// Log records carried by log-write messages
    LogRecordsAppended,
    /// Replies enqueued for transport
    RepliesSent,
}

/// Metrics registry containing all operational counters.
///
/// # Thread Safety
///
/// All counters use atomic operations for thread-safe increments.
/// Relaxed ordering: counters are read only after worker threads join.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    msgs_encoded: AtomicU64,
    msgs_decoded: AtomicU64,
    batches_packed: AtomicU64,
    batches_unpacked: AtomicU64,
    row_reads: AtomicU64,
    row_prewrites: AtomicU64,
    txn_commits: AtomicU64,
    txn_aborts: AtomicU64,
    txn_releases: AtomicU64,
    log_records_appended: AtomicU64,
    replies_sent: AtomicU64,
}

impl MetricsRegistry {
    /// Create a registry with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::MsgsEncoded => &self.msgs_encoded,
            Counter::MsgsDecoded => &self.msgs_decoded,
            Counter::BatchesPacked => &self.batches_packed,
            Counter::BatchesUnpacked => &self.batches_unpacked,
            Counter::RowReads => &self.row_reads,
            Counter::RowPrewrites => &self.row_prewrites,
            Counter::TxnCommits => &self.txn_commits,
            Counter::TxnAborts => &self.txn_aborts,
            Counter::TxnReleases => &self.txn_releases,
            Counter::LogRecordsAppended => &self.log_records_appended,
            Counter::RepliesSent => &self.replies_sent,
        }
    }

    /// Add `delta` to a counter.
    pub fn record(&self, counter: Counter, delta: u64) {
        self.cell(counter).fetch_add(delta, Ordering::Relaxed);
    }

    /// Increment a counter by one.
    pub fn inc(&self, counter: Counter) {
        self.record(counter, 1);
    }

    /// Read the current value of a counter.
    pub fn get(&self, counter: Counter) -> u64 {
        self.cell(counter).load(Ordering::Relaxed)
    }

    /// Snapshot all counters as (name, value) pairs in declaration order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("msgs_encoded", self.get(Counter::MsgsEncoded)),
            ("msgs_decoded", self.get(Counter::MsgsDecoded)),
            ("batches_packed", self.get(Counter::BatchesPacked)),
            ("batches_unpacked", self.get(Counter::BatchesUnpacked)),
            ("row_reads", self.get(Counter::RowReads)),
            ("row_prewrites", self.get(Counter::RowPrewrites)),
            ("txn_commits", self.get(Counter::TxnCommits)),
            ("txn_aborts", self.get(Counter::TxnAborts)),
            ("txn_releases", self.get(Counter::TxnReleases)),
            ("log_records_appended", self.get(Counter::LogRecordsAppended)),
            ("replies_sent", self.get(Counter::RepliesSent)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = MetricsRegistry::new();
        for (_, value) in metrics.snapshot() {
            assert_eq!(value, 0);
        }
    }

    #[test]
    fn test_record_and_get() {
        let metrics = MetricsRegistry::new();
        metrics.record(Counter::MsgsEncoded, 5);
        metrics.inc(Counter::MsgsEncoded);
        assert_eq!(metrics.get(Counter::MsgsEncoded), 6);
        assert_eq!(metrics.get(Counter::MsgsDecoded), 0);
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let metrics = Arc::new(MetricsRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let m = Arc::clone(&metrics);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    m.inc(Counter::TxnCommits);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.get(Counter::TxnCommits), 4000);
    }

    #[test]
    fn test_snapshot_covers_all_counters() {
        let metrics = MetricsRegistry::new();
        metrics.inc(Counter::RepliesSent);
        let snap = metrics.snapshot();
        assert_eq!(snap.len(), 11);
        assert!(snap.contains(&("replies_sent", 1)));
    }
}
