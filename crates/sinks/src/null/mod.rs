//! Null sink - logs and discards every table
//!
//! Registered as `dummy` (and `null`). Useful for trying out a receiver
//! setup, or for measuring batching throughput without a database.
//!
//! # Example
//!
//! ```toml
//! [sinks.dummy]
//! type = "dummy"
//! ```

use async_trait::async_trait;
use rowbatch_table::Table;

use crate::common::{MetricsSnapshot, Sink, SinkError, SinkMetrics};

/// Sink that only counts what it receives
pub struct NullSink {
    name: String,
    metrics: SinkMetrics,
}

impl NullSink {
    /// Create a null sink named `dummy`
    pub fn new() -> Self {
        Self::with_name("dummy")
    }

    /// Create a null sink with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: SinkMetrics::new(),
        }
    }

    /// Get reference to metrics
    #[inline]
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, table: &Table) -> Result<(), SinkError> {
        let rows = table.row_count();
        self.metrics.table_written(rows as u64);
        tracing::info!(
            sink = %self.name,
            table = %table.signature().name(),
            rows,
            "dummy sink did nothing with rows"
        );
        Ok(())
    }
}
