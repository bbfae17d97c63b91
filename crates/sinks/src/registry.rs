//! Sink Registry - configuration-driven sink creation
//!
//! Maps sink type names (the `type` key of a `[sinks.<name>]` table) to
//! factories. Factories are async because creating a sink usually means
//! connecting to its backend.
//!
//! # Example
//!
//! ```ignore
//! let registry = SinkRegistry::with_defaults();
//! let sinks = registry.create_all(&config.sinks).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rowbatch_config::{SinkConfig, SinksConfig};

use crate::clickhouse::{ClickHouseConfig, ClickHouseSink};
use crate::common::{Sink, SinkError};
use crate::mysql::{MySqlConfig, MySqlSink};
use crate::null::NullSink;

/// Factory trait for creating sinks
#[async_trait]
pub trait SinkFactory: Send + Sync {
    /// Create an initialised sink instance
    ///
    /// # Errors
    /// `SinkError::Config` if the config belongs to another sink type,
    /// `SinkError::Init` if the backend can't be reached
    async fn create(&self, name: &str, config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError>;

    /// Human-readable name for this factory (for error messages)
    fn name(&self) -> &'static str;
}

/// Registry for sink factories
pub struct SinkRegistry {
    factories: HashMap<String, Box<dyn SinkFactory>>,
}

impl SinkRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in sink type
    ///
    /// - `dummy` / `null` - [`NullSink`]
    /// - `clickhouse` - [`ClickHouseSink`]
    /// - `mysql` - [`MySqlSink`]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("dummy", NullFactory);
        registry.register("null", NullFactory);
        registry.register("clickhouse", ClickHouseFactory);
        registry.register("mysql", MySqlFactory);
        registry
    }

    /// Register a sink factory
    ///
    /// # Panics
    /// Panics if a factory is already registered with this name.
    pub fn register<F: SinkFactory + 'static>(&mut self, type_name: &str, factory: F) {
        if self.factories.contains_key(type_name) {
            panic!("sink factory '{}' already registered", type_name);
        }
        self.factories.insert(type_name.to_string(), Box::new(factory));
    }

    /// Create one sink from its configuration
    pub async fn create(
        &self,
        name: &str,
        config: &SinkConfig,
    ) -> Result<Arc<dyn Sink>, SinkError> {
        let type_name = config.type_name();
        let factory = self.factories.get(type_name).ok_or_else(|| {
            let mut available = self.available_types();
            available.sort_unstable();
            SinkError::config(format!(
                "unknown sink type '{}', available: [{}]",
                type_name,
                available.join(", ")
            ))
        })?;

        factory.create(name, config).await
    }

    /// Create every configured sink, in name order
    pub async fn create_all(&self, sinks: &SinksConfig) -> Result<Vec<Arc<dyn Sink>>, SinkError> {
        let mut created = Vec::with_capacity(sinks.len());
        for (name, config) in sinks.iter() {
            let sink = self.create(name, config).await?;
            tracing::info!(sink = %name, sink_type = config.type_name(), "sink ready");
            created.push(sink);
        }
        Ok(created)
    }

    /// Check if a sink type is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Get list of registered sink types
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for [`NullSink`]
pub struct NullFactory;

#[async_trait]
impl SinkFactory for NullFactory {
    async fn create(&self, name: &str, config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
        match config {
            SinkConfig::Dummy(_) => Ok(Arc::new(NullSink::with_name(name))),
            other => Err(mismatch(self.name(), other)),
        }
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}

/// Factory for [`ClickHouseSink`]
pub struct ClickHouseFactory;

#[async_trait]
impl SinkFactory for ClickHouseFactory {
    async fn create(&self, name: &str, config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
        let SinkConfig::Clickhouse(config) = config else {
            return Err(mismatch(self.name(), config));
        };

        let sink = ClickHouseSink::connect(name, ClickHouseConfig::from(config))
            .await
            .map_err(|e| SinkError::init(name, e.to_string()))?;
        Ok(Arc::new(sink))
    }

    fn name(&self) -> &'static str {
        "clickhouse"
    }
}

/// Factory for [`MySqlSink`]
pub struct MySqlFactory;

#[async_trait]
impl SinkFactory for MySqlFactory {
    async fn create(&self, name: &str, config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
        let SinkConfig::Mysql(config) = config else {
            return Err(mismatch(self.name(), config));
        };

        let sink = MySqlSink::connect(name, MySqlConfig::from(config))
            .await
            .map_err(|e| SinkError::init(name, e.to_string()))?;
        Ok(Arc::new(sink))
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

fn mismatch(factory: &str, config: &SinkConfig) -> SinkError {
    SinkError::config(format!(
        "{} factory got a '{}' sink config",
        factory,
        config.type_name()
    ))
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
