//! ClickHouse sink errors

use super::types::ConvertError;

/// Errors from ClickHouse sink
#[derive(Debug, thiserror::Error)]
pub enum ClickHouseSinkError {
    /// ClickHouse client error (structure queries)
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// HTTP transport error (inserts)
    #[error("clickhouse http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Table name has no database and none is configured
    #[error("no database in table name or sink config for {table}")]
    NoDatabase { table: String },

    /// `system.columns` has nothing for the table
    #[error("get table structure for {table}: no column info for a table")]
    NoTableStructure { table: String },

    /// A cell did not convert to its column type
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Server rejected the insert
    #[error("insert into {table} failed: HTTP {status}: {message}")]
    InsertFailed {
        table: String,
        status: u16,
        message: String,
    },

    /// Encoding rows failed
    #[error("failed to encode rows: {0}")]
    Encode(#[from] serde_json::Error),
}
