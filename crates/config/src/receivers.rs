//! Receiver configuration types
//!
//! Receivers are the front ends that accept rows from clients and hand them
//! to the table manager holder. They are named instances, so several HTTP
//! listeners can run side by side.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Container for all receiver configurations
///
/// # Example
///
/// ```toml
/// [receivers.main]
/// type = "http"
/// bind = "0.0.0.0:8124"
///
/// [receivers.internal]
/// type = "http"
/// bind = "127.0.0.1:9124"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReceiversConfig {
    /// Named receiver instances
    #[serde(flatten)]
    receivers: HashMap<String, ReceiverConfig>,
}

impl ReceiversConfig {
    /// Get a receiver by name
    pub fn get(&self, name: &str) -> Option<&ReceiverConfig> {
        self.receivers.get(name)
    }

    /// Iterate over all receivers
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReceiverConfig)> {
        self.receivers.iter()
    }

    /// Get the number of configured receivers
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    /// Check if no receivers are configured
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

/// Configuration for a single receiver instance
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReceiverConfig {
    /// HTTP receiver
    Http(HttpReceiverConfig),
}

impl ReceiverConfig {
    /// Get the receiver type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
        }
    }
}

/// HTTP receiver configuration
///
/// ```toml
/// [receivers.main]
/// type = "http"
/// bind = "0.0.0.0:8124"
/// shutdown_timeout = "2s"
/// max_payload_size = 16777216
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpReceiverConfig {
    /// Listen address (host:port)
    /// Required
    pub bind: String,

    /// How long in-flight requests get to finish on shutdown
    /// Default: 2s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Maximum request body size in bytes
    /// Default: 16MB
    pub max_payload_size: usize,
}

impl Default for HttpReceiverConfig {
    fn default() -> Self {
        Self {
            bind: String::new(),
            shutdown_timeout: Duration::from_secs(2),
            max_payload_size: 16 * 1024 * 1024,
        }
    }
}
