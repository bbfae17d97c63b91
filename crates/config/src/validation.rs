//! Cross-field checks run after parsing
//!
//! Deserialization only guarantees types; these checks reject configs that
//! would fail later at startup or on the first request.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::receivers::ReceiverConfig;
use crate::sinks::SinkConfig;

pub fn validate_config(config: &Config) -> Result<()> {
    validate_holder(config)?;
    validate_receivers(config)?;
    validate_sinks(config)
}

fn validate_holder(config: &Config) -> Result<()> {
    let holder = &config.holder;
    non_zero_duration("holder", "idle_timeout", holder.idle_timeout)?;
    non_zero_duration("holder", "stop_timeout", holder.stop_timeout)?;
    positive("holder", "pool_size", holder.pool_size)
}

fn validate_receivers(config: &Config) -> Result<()> {
    if config.receivers.is_empty() {
        return Err(ConfigError::NoReceivers);
    }

    // address -> receivers binding it, sorted for stable messages
    let mut binds: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, receiver) in config.receivers.iter() {
        let table = format!("receivers.{name}");
        match receiver {
            ReceiverConfig::Http(http) => {
                if http.bind.is_empty() {
                    return Err(ConfigError::missing_field(table, "bind"));
                }
                non_zero_duration(&table, "shutdown_timeout", http.shutdown_timeout)?;
                positive(&table, "max_payload_size", http.max_payload_size)?;
                binds.entry(http.bind.as_str()).or_default().push(name);
            }
        }
    }

    if let Some((address, mut receivers)) = binds.into_iter().find(|(_, r)| r.len() > 1) {
        receivers.sort_unstable();
        return Err(ConfigError::duplicate_bind(address, receivers.join(", ")));
    }

    Ok(())
}

fn validate_sinks(config: &Config) -> Result<()> {
    if config.sinks.is_empty() {
        return Err(ConfigError::NoSinks);
    }

    for (name, sink) in config.sinks.iter() {
        let table = format!("sinks.{name}");
        match sink {
            SinkConfig::Dummy(_) => {}
            SinkConfig::Clickhouse(ch) => {
                if ch.url.is_empty() {
                    return Err(ConfigError::missing_field(table, "url"));
                }
                if !ch.url.starts_with("http://") && !ch.url.starts_with("https://") {
                    return Err(ConfigError::invalid_value(
                        table,
                        "url",
                        "must start with http:// or https://",
                    ));
                }
                non_zero_duration(&table, "insert_timeout", ch.insert_timeout)?;
            }
            SinkConfig::Mysql(my) => {
                if my.dsn.is_empty() {
                    return Err(ConfigError::missing_field(table, "dsn"));
                }
                positive(&table, "max_connections", my.max_connections as usize)?;
                non_zero_duration(&table, "insert_timeout", my.insert_timeout)?;
            }
        }
    }

    Ok(())
}

fn non_zero_duration(table: &str, field: &'static str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(ConfigError::invalid_value(table, field, "must be non-zero"));
    }
    Ok(())
}

fn positive(table: &str, field: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::invalid_value(table, field, "must be greater than zero"));
    }
    Ok(())
}
