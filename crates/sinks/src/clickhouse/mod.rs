//! ClickHouse Sink
//!
//! Writes flushed tables into ClickHouse through its HTTP interface.
//!
//! # Flow
//!
//! ```text
//! Table (db.events | id,name,ts)
//!    │ resolve database (qualified name, else configured database)
//!    ▼
//! system.columns ──▶ TableStructure (cached) ──▶ convert every cell
//!    │
//!    ▼
//! POST /?query=INSERT INTO db.events (id,name,ts) FORMAT JSONCompactEachRow
//! ```
//!
//! Cells are converted to the column types before sending, so a bad value
//! fails the whole insert with an error naming the column instead of
//! producing a partially written batch.

mod config;
mod error;
mod sink;
mod types;

pub use config::{ClickHouseConfig, DEFAULT_STRUCTURE_TTL};
pub use error::ClickHouseSinkError;
pub use sink::ClickHouseSink;
pub use types::{CellValue, ColumnType, ConvertError, TableStructure, convert_row};
