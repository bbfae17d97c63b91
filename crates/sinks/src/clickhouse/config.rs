//! ClickHouse sink configuration

use std::time::Duration;

use clickhouse::Client;
use rowbatch_config::{ClickHouseSinkConfig, DEFAULT_INSERT_TIMEOUT};

/// How long a fetched table structure is trusted before refetching
pub const DEFAULT_STRUCTURE_TTL: Duration = Duration::from_secs(60);

/// Resolved ClickHouse sink settings
///
/// `url` never ends with a slash and `database` is never empty, so both can
/// be used as is when building requests.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    pub url: String,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bound on one INSERT request
    pub insert_timeout: Duration,
    /// Lifetime of cached `system.columns` lookups
    pub structure_ttl: Duration,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: None,
            username: None,
            password: None,
            insert_timeout: DEFAULT_INSERT_TIMEOUT,
            structure_ttl: DEFAULT_STRUCTURE_TTL,
        }
    }
}

impl From<&ClickHouseSinkConfig> for ClickHouseConfig {
    fn from(config: &ClickHouseSinkConfig) -> Self {
        Self {
            url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone().filter(|db| !db.is_empty()),
            username: config.username.clone(),
            password: config.password.clone(),
            insert_timeout: config.insert_timeout,
            structure_ttl: DEFAULT_STRUCTURE_TTL,
        }
    }
}

impl ClickHouseConfig {
    /// Set the ClickHouse URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database for unqualified table names
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set how long fetched table structures are reused
    pub fn with_structure_ttl(mut self, ttl: Duration) -> Self {
        self.structure_ttl = ttl;
        self
    }

    /// Client used for `system.columns` queries
    pub fn build_client(&self) -> Client {
        let client = Client::default().with_url(&self.url);
        let client = match self.username {
            Some(ref username) => client.with_user(username),
            None => client,
        };
        match self.password {
            Some(ref password) => client.with_password(password),
            None => client,
        }
    }
}
