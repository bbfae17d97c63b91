//! Rowbatch Configuration
//!
//! TOML-based configuration loading with sensible defaults. Only receivers
//! and sinks have to be declared; everything else falls back to defaults.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use rowbatch_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(concat!(
//!     "[receivers.main]\ntype = \"http\"\nbind = \"127.0.0.1:8124\"\n\n",
//!     "[sinks.dummy]\ntype = \"dummy\"",
//! ))
//! .unwrap();
//! assert_eq!(config.sinks.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [holder]
//! idle_timeout = "10s"
//! stop_timeout = "5s"
//!
//! [error_log]
//! path = "insert_errors.jsonl"
//!
//! [receivers.main]
//! type = "http"
//! bind = "0.0.0.0:8124"
//!
//! [sinks.clickhouse_main]
//! type = "clickhouse"
//! url = "http://localhost:8123"
//! database = "default"
//! ```

mod error;
mod error_log;
mod holder;
mod logging;
mod receivers;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use error_log::ErrorLogConfig;
pub use holder::HolderConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use receivers::{HttpReceiverConfig, ReceiverConfig, ReceiversConfig};
pub use sinks::{
    ClickHouseSinkConfig, DEFAULT_INSERT_TIMEOUT, MySqlSinkConfig, NullSinkConfig, SinkConfig,
    SinksConfig,
};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Table manager holder settings (eviction, shutdown, pooling)
    pub holder: HolderConfig,

    /// Failed-flush recording
    pub error_log: ErrorLogConfig,

    /// Front ends accepting rows
    pub receivers: ReceiversConfig,

    /// Storage backends receiving every flushed table
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
