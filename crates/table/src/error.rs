//! Table error types
//!
//! Two families: signature validation failures, detected before a request
//! reaches a manager, and row-shape failures returned from appends.

use thiserror::Error;

/// Errors from validating a [`TableSignature`](crate::TableSignature)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Table name is empty
    #[error("table name is empty")]
    EmptyTableName,

    /// A dot-separated segment of the table name is empty
    #[error("table name '{name}' has an empty part")]
    EmptyTableNamePart { name: String },

    /// A table name segment is quoted on one side only
    #[error("table name '{name}' has an unbalanced backtick")]
    TableNameInvalidBacktick { name: String },

    /// No fields were given
    #[error("fields are empty")]
    EmptyFields,

    /// One of the fields is empty
    #[error("field #{index} is empty")]
    EmptyField { index: usize },

    /// A field is quoted on one side only
    #[error("field '{field}' has an unbalanced backtick")]
    FieldInvalidBacktick { field: String },
}

/// Errors from appending rows to a [`Table`](crate::Table)
#[derive(Debug, Error)]
pub enum TableError {
    /// Payload is not a JSON array of arrays
    #[error("append rows: json parsing: {0}")]
    MalformedEncoding(#[from] serde_json::Error),

    /// A row does not have one cell per field
    #[error("wrong row length: need {expected}, got {actual}, row #{row} {values}")]
    RowWidthMismatch {
        /// Index of the offending row within the batch
        row: usize,
        /// Number of fields in the signature
        expected: usize,
        /// Number of cells in the row
        actual: usize,
        /// The row as JSON text
        values: String,
    },
}

/// Result type for table operations
pub type Result<T> = std::result::Result<T, TableError>;
