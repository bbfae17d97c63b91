//! HTTP receiver metrics
//!
//! Atomic counters for tracking ingestion requests.

use std::sync::atomic::{AtomicU64, Ordering};

/// HTTP receiver metrics
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// Total HTTP requests received
    pub requests_total: AtomicU64,

    /// Successful requests (2xx)
    pub requests_success: AtomicU64,

    /// Rejected requests (4xx)
    pub requests_client_error: AtomicU64,

    /// Requests with the wrong method
    pub method_not_allowed: AtomicU64,

    /// Synchronous requests
    pub sync_requests: AtomicU64,

    /// Payload bytes received
    pub bytes_received: AtomicU64,
}

impl ReceiverMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_client_error: AtomicU64::new(0),
            method_not_allowed: AtomicU64::new(0),
            sync_requests: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    /// Record a request received
    #[inline]
    pub fn request_received(&self, bytes: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a successful request
    #[inline]
    pub fn request_success(&self) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected request
    #[inline]
    pub fn request_client_error(&self) {
        self.requests_client_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a non-POST request
    #[inline]
    pub fn method_not_allowed(&self) {
        self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
        self.request_client_error();
    }

    /// Record a synchronous request
    #[inline]
    pub fn sync_request(&self) {
        self.sync_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ReceiverMetricsSnapshot {
        ReceiverMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_client_error: self.requests_client_error.load(Ordering::Relaxed),
            method_not_allowed: self.method_not_allowed.load(Ordering::Relaxed),
            sync_requests: self.sync_requests.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ReceiverMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverMetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_client_error: u64,
    pub method_not_allowed: u64,
    pub sync_requests: u64,
    pub bytes_received: u64,
}
