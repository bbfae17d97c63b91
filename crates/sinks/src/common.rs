//! The sink contract
//!
//! The [`Sink`] trait every backend implements, the error type shared by all
//! of them, and per-sink insert counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rowbatch_table::Table;
use thiserror::Error;

use crate::clickhouse::ClickHouseSinkError;
use crate::mysql::MySqlSinkError;

/// A storage backend receiving flushed tables
///
/// Sinks are created already initialised (see
/// [`SinkRegistry`](crate::SinkRegistry)) and shared between every table
/// manager, so `insert` may run concurrently for different tables.
///
/// `insert` gets a read-only table that other sinks may be reading at the
/// same time. It must not keep a reference to it after returning; iterate
/// with [`Table::rows`], which gives each caller its own cursor.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Configured name of this sink instance
    fn name(&self) -> &str;

    /// Write every row of the table
    async fn insert(&self, table: &Table) -> Result<(), SinkError>;
}

/// Counters shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Tables successfully written
    pub tables_written: AtomicU64,

    /// Rows successfully written
    pub rows_written: AtomicU64,

    /// Failed inserts
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            tables_written: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a successfully written table
    #[inline]
    pub fn table_written(&self, rows: u64) {
        self.tables_written.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    /// Record a failed insert
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tables_written: self.tables_written.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tables_written: u64,
    pub rows_written: u64,
    pub write_errors: u64,
}

/// Why a sink could not take a table
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink '{sink}': {message}")]
    Init { sink: String, message: String },

    /// Configuration does not fit the sink type
    #[error("configuration error: {0}")]
    Config(String),

    /// Insert did not complete in time
    #[error("insert into {table} timed out after {timeout:?}")]
    Timeout { table: String, timeout: Duration },

    /// Generic write failure
    #[error("write failed: {0}")]
    Write(String),

    /// ClickHouse backend error
    #[error(transparent)]
    ClickHouse(#[from] ClickHouseSinkError),

    /// MySQL backend error
    #[error(transparent)]
    MySql(#[from] MySqlSinkError),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Init {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(table: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            table: table.into(),
            timeout,
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
