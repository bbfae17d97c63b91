//! Client error types

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from sending rows
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rows could not be serialized to JSON
    #[error("rowbatch http client: encoding rows: {0}")]
    Encode(#[from] serde_json::Error),

    /// Request could not be sent or the response could not be read
    #[error("rowbatch http client: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with something other than 200
    #[error("rowbatch http client: got non-200 response: code {code}, response: {body}")]
    Status { code: u16, body: String },
}

impl ClientError {
    /// Whether the server rejected the request itself (4xx)
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Status { code, .. } if (400..500).contains(code))
    }
}
