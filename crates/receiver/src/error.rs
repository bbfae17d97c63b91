//! Receiver error types

use std::time::Duration;

/// Receiver errors
///
/// Any of these ends the receiver; the process is expected to shut down.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server failed while running
    #[error("HTTP error: {0}")]
    Http(String),

    /// In-flight requests did not finish in time
    #[error("receiver {name} didn't shut down within {timeout:?}")]
    ShutdownTimeout { name: String, timeout: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReceiverError::Bind {
            address: "127.0.0.1:1".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("failed to bind to 127.0.0.1:1"));

        let err = ReceiverError::ShutdownTimeout {
            name: "main".into(),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "receiver main didn't shut down within 2s");
    }
}
