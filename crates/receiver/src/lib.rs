//! Rowbatch - Receivers
//!
//! Front ends that accept rows from clients and hand them to the table
//! manager [`Holder`](rowbatch_manager::Holder).
//!
//! # Available Receivers
//!
//! | Receiver | Protocol |
//! |----------|----------|
//! | `http` | `POST /?table=..&fields=..&timeout_ms=..&max_rows=..` with a JSON array of rows |

/// HTTP receiver - axum server
pub mod http;

mod error;

pub use error::ReceiverError;
pub use http::{HttpReceiver, ReceiverMetrics, ReceiverMetricsSnapshot};
