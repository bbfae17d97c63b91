//! Rowbatch - Tables
//!
//! The data model shared by every rowbatch crate.
//!
//! ```text
//! TableSignature ("db.events", [a, b])     key = "db.events|a,b"
//!        │
//!        ▼
//!   Table ── flat row-major Vec<Value> ──▶ rows()/next_row() ──▶ sinks
//!        ▲                                           │
//!        └──────────── TablePool (get/put) ◀─────────┘ release()
//! ```
//!
//! A [`Table`] is filled by a single owner, then frozen and shared read-only
//! with every sink of a flush. Its storage comes from, and returns to, a
//! [`TablePool`] injected at construction.

mod error;
mod pool;
mod signature;
mod table;

pub use error::{Result, SignatureError, TableError};
pub use pool::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_BUFFER_LEN, DEFAULT_POOL_SIZE, PoolMetricsSnapshot,
    TablePool, TablePoolMetrics,
};
pub use signature::TableSignature;
pub use table::Table;

/// Cell value type stored in tables
pub use serde_json::Value;
