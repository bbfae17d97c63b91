//! Table manager error types

use rowbatch_sinks::SinkError;
use rowbatch_table::{SignatureError, TableError};
use thiserror::Error;

use crate::config::TableManagerConfigError;

/// One sink's failure within a flush
#[derive(Debug)]
pub struct SinkFailure {
    /// Name of the failed sink
    pub sink: String,

    /// What the sink reported
    pub error: SinkError,
}

/// A flush in which at least one sink failed
///
/// Sinks that succeeded keep what they wrote; nothing is retried.
#[derive(Debug, Error)]
#[error("{}", join_failures(.failures))]
pub struct FlushError {
    pub failures: Vec<SinkFailure>,
}

impl FlushError {
    /// Names of the sinks that failed
    pub fn failed_sinks(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.sink.as_str())
    }
}

fn join_failures(failures: &[SinkFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.sink, failure.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced to callers of the holder and table managers
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Invalid table name or field list
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Invalid per-request batching settings
    #[error(transparent)]
    Config(#[from] TableManagerConfigError),

    /// Payload could not be appended
    #[error(transparent)]
    Table(#[from] TableError),

    /// Synchronous flush failed in at least one sink
    #[error(transparent)]
    Flush(#[from] FlushError),

    /// Synchronous flush task was cancelled before it reported
    #[error("synchronous flush task failed: {0}")]
    SyncTask(#[source] tokio::task::JoinError),

    /// Manager did not acknowledge stop within the shutdown timeout
    #[error("table manager {table} didn't stop in time")]
    StopTimeout { table: String },
}

impl ManagerError {
    /// Whether the request itself was at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Signature(_) | Self::Config(_) | Self::Table(_))
    }
}

/// Result type for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;
