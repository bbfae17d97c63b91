//! Rowbatch - Sinks
//!
//! Storage backends that receive every flushed table.
//!
//! # Architecture
//!
//! A table manager flushes one [`Table`](rowbatch_table::Table) to all
//! configured sinks at once. Each sink gets a shared read-only reference and
//! writes it in a single insert (or a single transaction).
//!
//! ```text
//! [TableManager] --&Table--> [Sink::insert] --> [Destination]
//!        │                         │ error
//!        │                         ▼
//!        └──────────────── [InsertErrorLogger] --> insert_errors.jsonl
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `dummy` / `null` | Log and discard (testing, throughput runs) |
//! | `clickhouse` | ClickHouse over HTTP, values converted per column type |
//! | `mysql` | MySQL `INSERT IGNORE` through a connection pool |
//!
//! # Example
//!
//! ```ignore
//! use rowbatch_sinks::SinkRegistry;
//!
//! let sinks = SinkRegistry::with_defaults().create_all(&config.sinks).await?;
//! for sink in &sinks {
//!     sink.insert(&table).await?;
//! }
//! ```

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Null sink - logs and discards every table
pub mod null;

/// ClickHouse sink - analytics database over HTTP
pub mod clickhouse;

/// MySQL sink - `INSERT IGNORE` through sqlx
pub mod mysql;

// =============================================================================
// Shared pieces
// =============================================================================

/// Common types shared by all sinks (trait, errors, metrics)
mod common;

/// File log of failed inserts
mod error_log;

/// Factories creating sinks from configuration
mod registry;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, Sink, SinkError, SinkMetrics};
pub use error_log::InsertErrorLogger;
pub use registry::{ClickHouseFactory, MySqlFactory, NullFactory, SinkFactory, SinkRegistry};

pub use self::clickhouse::{ClickHouseConfig, ClickHouseSink, ClickHouseSinkError};
pub use mysql::{MySqlConfig, MySqlSink, MySqlSinkError};
pub use null::NullSink;
