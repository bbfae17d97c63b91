//! Rowbatch - Table Managers
//!
//! The batching engine: one [`TableManager`] per table signature buffers
//! rows and flushes them to every sink, and the [`Holder`] routes appends to
//! managers, evicts idle ones and shuts them all down.
//!
//! # Architecture
//!
//! ```text
//! [Receiver] ── append(sig, config, sync, rows) ──▶ [Holder]
//!                                                     │ key lookup
//!                           ┌─────────────────────────┼─────────────────────┐
//!                           ▼                         ▼                     ▼
//!                    [TableManager a]          [TableManager b]      (sync: throwaway
//!                     timer / max_rows          timer / max_rows       manager, flushed
//!                           │                         │                inline)
//!                           └──────── flush ──────────┴──▶ [Sink] × N
//! ```
//!
//! # Delivery
//!
//! Each flush is attempted once. Sinks that fail are reported and the table
//! is written to the insert error log; nothing is retried. Rows buffered but
//! not yet flushed are lost if the process dies.
//!
//! # Example
//!
//! ```ignore
//! let context = ManagerContext::new(sinks).with_pool(pool);
//! let holder = Arc::new(Holder::new(context, &config.holder));
//! holder.spawn_eviction(cancel.clone());
//!
//! let sig = Arc::new(TableSignature::new("db.events", "id,name"));
//! let config = TableManagerConfig::new(Duration::from_secs(1), 1000);
//! holder.append(&sig, &config, false, br#"[[1,"a"]]"#).await?;
//!
//! for err in holder.stop_all().await {
//!     tracing::error!(error = %err, "shutdown");
//! }
//! ```

mod config;
mod error;
mod holder;
mod manager;
mod metrics;

pub use config::{TableManagerConfig, TableManagerConfigError};
pub use error::{FlushError, ManagerError, Result, SinkFailure};
pub use holder::Holder;
pub use manager::{ManagerContext, TableManager};
pub use metrics::{ManagerMetrics, MetricsSnapshot};

#[cfg(test)]
mod testing;
