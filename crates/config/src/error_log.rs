//! Insert error log settings

use serde::Deserialize;
use std::path::PathBuf;

/// Where failed flushes are recorded
///
/// # Example
///
/// ```toml
/// [error_log]
/// path = "insert_errors.jsonl"
/// pretty_print = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorLogConfig {
    /// File receiving one JSON record per failed flush.
    /// Default: none (recording disabled)
    pub path: Option<PathBuf>,

    /// Indent records instead of writing one per line
    /// Default: false
    pub pretty_print: bool,
}

impl ErrorLogConfig {
    /// Whether failed flushes are recorded at all
    pub fn is_enabled(&self) -> bool {
        self.path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }
}
