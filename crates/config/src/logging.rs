//! `[log]` section
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Verbosity of rowbatch's own output, most severe first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    /// Startup, shutdown and sink failures
    #[default]
    Info,
    /// Adds one line per flush and per rejected request
    Debug,
    Trace,
}

impl LogLevel {
    /// Every level, most severe first
    pub const ALL: [LogLevel; 5] = [Self::Error, Self::Warn, Self::Info, Self::Debug, Self::Trace];

    /// Name accepted by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per event
    Json,
}

/// Logging settings; both fields default when absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LogConfig {
    /// Filter directive for the subscriber
    ///
    /// A directive given on the command line replaces the configured level
    /// as is, so it may carry per-target filters like `rowbatch_manager=debug`.
    pub fn directive(&self, cli_level: Option<&str>) -> String {
        match cli_level {
            Some(directive) if !directive.trim().is_empty() => directive.to_string(),
            _ => self.level.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_fields() {
        let config: LogConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(toml::from_str::<LogConfig>("format = \"xml\"").is_err());
    }

    #[test]
    fn test_level_names() {
        for level in LogLevel::ALL {
            let config: LogConfig = toml::from_str(&format!("level = \"{level}\"")).unwrap();
            assert_eq!(config.level, level);
            assert_eq!(level.as_str().parse::<LogLevel>(), Ok(level));
        }
        assert_eq!(" WARN ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(
            "loud".parse::<LogLevel>(),
            Err("unknown log level 'loud'".to_string())
        );
    }

    #[test]
    fn test_levels_order_by_verbosity() {
        assert!(LogLevel::Error < LogLevel::Info);
        assert!(LogLevel::Trace > LogLevel::Debug);
    }

    #[test]
    fn test_directive() {
        let config = LogConfig {
            level: LogLevel::Warn,
            format: LogFormat::Console,
        };
        assert_eq!(config.directive(None), "warn");
        assert_eq!(config.directive(Some("")), "warn");
        assert_eq!(config.directive(Some("rowbatch_manager=debug")), "rowbatch_manager=debug");
    }
}
