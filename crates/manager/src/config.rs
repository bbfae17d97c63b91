//! Per-table batching settings
//!
//! Every append request carries its own `timeout_ms` and `max_rows`; the
//! latest request for a table wins.

use std::time::Duration;

use thiserror::Error;

/// When a table manager flushes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableManagerConfig {
    /// Longest time rows wait before being flushed
    pub timeout: Duration,

    /// Row count that triggers an early flush
    pub max_rows: usize,

    /// Keep unflushed rows across restarts (not supported)
    pub persist: bool,
}

impl TableManagerConfig {
    /// Create a config without persistence
    pub fn new(timeout: Duration, max_rows: usize) -> Self {
        Self {
            timeout,
            max_rows,
            persist: false,
        }
    }

    /// Check that the config can drive a table manager
    pub fn validate(&self) -> Result<(), TableManagerConfigError> {
        if self.timeout.is_zero() {
            return Err(TableManagerConfigError::ZeroTimeout);
        }
        if self.max_rows == 0 {
            return Err(TableManagerConfigError::ZeroMaxRows);
        }
        if self.persist {
            return Err(TableManagerConfigError::PersistNotSupported);
        }
        Ok(())
    }
}

/// Rejected per-request batching settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableManagerConfigError {
    #[error("timeout_ms couldn't be zero")]
    ZeroTimeout,

    #[error("max_rows couldn't be zero")]
    ZeroMaxRows,

    #[error("persist is not yet supported")]
    PersistNotSupported,
}
