//! Configuration errors
//!
//! Validation errors name the TOML table they refer to, e.g.
//! `sinks.clickhouse_main`, so the message points at the offending section.

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Why a configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A section lacks a field it can't work without
    #[error("[{table}] is missing required field '{field}'")]
    MissingField { table: String, field: &'static str },

    /// A field is present but unusable
    #[error("[{table}] {field} {reason}")]
    InvalidValue {
        table: String,
        field: &'static str,
        reason: String,
    },

    #[error("receivers {receivers} all bind {address}")]
    DuplicateBind { address: String, receivers: String },

    #[error("no [receivers.<name>] section, at least one receiver is required")]
    NoReceivers,

    #[error("no [sinks.<name>] section, at least one sink is required")]
    NoSinks,
}

impl ConfigError {
    pub fn missing_field(table: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            table: table.into(),
            field,
        }
    }

    pub fn invalid_value(
        table: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table: table.into(),
            field,
            reason: reason.into(),
        }
    }

    pub fn duplicate_bind(address: impl Into<String>, receivers: impl Into<String>) -> Self {
        Self::DuplicateBind {
            address: address.into(),
            receivers: receivers.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_point_at_table() {
        assert_eq!(
            ConfigError::missing_field("sinks.clickhouse_main", "url").to_string(),
            "[sinks.clickhouse_main] is missing required field 'url'"
        );
        assert_eq!(
            ConfigError::invalid_value("holder", "stop_timeout", "must be non-zero").to_string(),
            "[holder] stop_timeout must be non-zero"
        );
        assert_eq!(
            ConfigError::duplicate_bind("0.0.0.0:8124", "a, b").to_string(),
            "receivers a, b all bind 0.0.0.0:8124"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = ConfigError::Read {
            path: "config.toml".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("can't read config file 'config.toml'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
