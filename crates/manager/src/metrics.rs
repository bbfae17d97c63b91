//! Table manager metrics
//!
//! Atomic counters shared by a holder and every table manager it creates.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for batching and flushing
#[derive(Debug, Default)]
pub struct ManagerMetrics {
    /// Table managers registered in the holder
    managers_created: AtomicU64,

    /// Table managers removed for being idle
    managers_evicted: AtomicU64,

    /// Rows accepted by append
    rows_appended: AtomicU64,

    /// Wake-ups dropped because one was already pending
    wakeups_coalesced: AtomicU64,

    /// Flushes that delivered to every sink
    flushes: AtomicU64,

    /// Rows handed to sinks (successful or not)
    rows_flushed: AtomicU64,

    /// Flushes in which at least one sink failed
    flush_failures: AtomicU64,

    /// Requests flushed through the synchronous path
    sync_flushes: AtomicU64,

    /// Managers that missed the shutdown deadline
    stop_timeouts: AtomicU64,
}

impl ManagerMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            managers_created: AtomicU64::new(0),
            managers_evicted: AtomicU64::new(0),
            rows_appended: AtomicU64::new(0),
            wakeups_coalesced: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            rows_flushed: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            sync_flushes: AtomicU64::new(0),
            stop_timeouts: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_manager_created(&self) {
        self.managers_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_evicted(&self, count: u64) {
        self.managers_evicted.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_appended(&self, rows: u64) {
        self.rows_appended.fetch_add(rows, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_wakeup_coalesced(&self) {
        self.wakeups_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flush, successful or not
    #[inline]
    pub fn record_flush(&self, rows: u64, failed: bool) {
        self.rows_flushed.fetch_add(rows, Ordering::Relaxed);
        if failed {
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
        } else {
            self.flushes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_sync_flush(&self) {
        self.sync_flushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stop_timeout(&self) {
        self.stop_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            managers_created: self.managers_created.load(Ordering::Relaxed),
            managers_evicted: self.managers_evicted.load(Ordering::Relaxed),
            rows_appended: self.rows_appended.load(Ordering::Relaxed),
            wakeups_coalesced: self.wakeups_coalesced.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            rows_flushed: self.rows_flushed.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            sync_flushes: self.sync_flushes.load(Ordering::Relaxed),
            stop_timeouts: self.stop_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of manager metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub managers_created: u64,
    pub managers_evicted: u64,
    pub rows_appended: u64,
    pub wakeups_coalesced: u64,
    pub flushes: u64,
    pub rows_flushed: u64,
    pub flush_failures: u64,
    pub sync_flushes: u64,
    pub stop_timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_counters() {
        let metrics = ManagerMetrics::new();
        metrics.record_flush(10, false);
        metrics.record_flush(5, true);
        metrics.record_appended(15);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.flushes, 1);
        assert_eq!(snapshot.flush_failures, 1);
        assert_eq!(snapshot.rows_flushed, 15);
        assert_eq!(snapshot.rows_appended, 15);
        assert_eq!(snapshot.managers_created, 0);
    }
}
