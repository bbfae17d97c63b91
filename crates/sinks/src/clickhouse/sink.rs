//! ClickHouse sink implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clickhouse::{Client, Row};
use parking_lot::RwLock;
use rowbatch_table::{Table, TableSignature};
use serde::Deserialize;

use super::config::ClickHouseConfig;
use super::error::ClickHouseSinkError;
use super::types::{TableStructure, convert_row};
use crate::common::{MetricsSnapshot, Sink, SinkError, SinkMetrics};

const COLUMNS_QUERY: &str =
    "SELECT name, type FROM system.columns WHERE database = ? AND `table` = ?";

/// Row of `system.columns`
#[derive(Debug, Row, Deserialize)]
struct ColumnRow {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

struct CachedStructure {
    structure: Arc<TableStructure>,
    fetched_at: Instant,
}

/// ClickHouse sink
///
/// Looks up each table's column types in `system.columns`, converts every
/// cell accordingly and sends the whole table as a single
/// `INSERT ... FORMAT JSONCompactEachRow` request over the HTTP interface.
pub struct ClickHouseSink {
    name: String,

    config: ClickHouseConfig,

    /// Client for structure queries
    client: Client,

    /// Client for inserts
    http: reqwest::Client,

    /// Column types per `database.table`
    structures: RwLock<HashMap<String, CachedStructure>>,

    metrics: SinkMetrics,
}

impl ClickHouseSink {
    /// Create a sink without contacting the server
    pub fn new(
        name: impl Into<String>,
        config: ClickHouseConfig,
    ) -> Result<Self, ClickHouseSinkError> {
        let http = reqwest::Client::builder()
            .timeout(config.insert_timeout)
            .build()?;

        Ok(Self {
            name: name.into(),
            client: config.build_client(),
            http,
            config,
            structures: RwLock::new(HashMap::new()),
            metrics: SinkMetrics::new(),
        })
    }

    /// Create a sink and check that the server answers
    pub async fn connect(
        name: impl Into<String>,
        config: ClickHouseConfig,
    ) -> Result<Self, ClickHouseSinkError> {
        let sink = Self::new(name, config)?;
        sink.client.query("SELECT 1").execute().await?;
        Ok(sink)
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Database and table to look the structure up under
    pub(crate) fn resolve_table<'a>(
        &'a self,
        signature: &'a TableSignature,
    ) -> Result<(&'a str, &'a str), ClickHouseSinkError> {
        match signature.unquoted_name_parts() {
            (Some(database), table) => Ok((database, table)),
            (None, table) => self
                .config
                .database
                .as_deref()
                .map(|database| (database, table))
                .ok_or_else(|| ClickHouseSinkError::NoDatabase {
                    table: signature.name().to_string(),
                }),
        }
    }

    /// Column types of a table, from cache while fresh
    async fn table_structure(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Arc<TableStructure>, ClickHouseSinkError> {
        let key = format!("{database}.{table}");

        let cached = self
            .structures
            .read()
            .get(&key)
            .filter(|cached| cached.fetched_at.elapsed() < self.config.structure_ttl)
            .map(|cached| Arc::clone(&cached.structure));
        if let Some(structure) = cached {
            return Ok(structure);
        }

        let rows = self
            .client
            .query(COLUMNS_QUERY)
            .bind(database)
            .bind(table)
            .fetch_all::<ColumnRow>()
            .await?;

        let mut structure = TableStructure::new();
        for row in rows {
            structure.insert(row.name, &row.column_type);
        }
        if structure.is_empty() {
            return Err(ClickHouseSinkError::NoTableStructure { table: key });
        }

        tracing::debug!(
            sink = %self.name,
            table = %key,
            columns = structure.len(),
            "fetched table structure"
        );

        let structure = Arc::new(structure);
        self.structures.write().insert(
            key,
            CachedStructure {
                structure: Arc::clone(&structure),
                fetched_at: Instant::now(),
            },
        );
        Ok(structure)
    }

    /// Drop a cached structure so the next insert refetches it
    fn forget_structure(&self, database: &str, table: &str) {
        self.structures.write().remove(&format!("{database}.{table}"));
    }

    #[cfg(test)]
    pub(crate) fn seed_structure(&self, database: &str, table: &str, structure: TableStructure) {
        self.structures.write().insert(
            format!("{database}.{table}"),
            CachedStructure {
                structure: Arc::new(structure),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Encode every row as one JSON array per line
    fn encode_rows(
        structure: &TableStructure,
        table: &Table,
    ) -> Result<Vec<u8>, ClickHouseSinkError> {
        let columns = structure.resolve(table.signature().fields())?;
        let mut body = Vec::with_capacity(table.raw_data().len() * 16);

        for row in table.rows() {
            let cells = convert_row(&columns, row)?;
            serde_json::to_writer(&mut body, &cells)?;
            body.push(b'\n');
        }
        Ok(body)
    }

    async fn write(&self, table: &Table) -> Result<(), ClickHouseSinkError> {
        let signature = table.signature();
        let (database, table_name) = self.resolve_table(signature)?;
        let structure = self.table_structure(database, table_name).await?;
        let body = Self::encode_rows(&structure, table)?;

        let result = self.send(signature, body).await;
        if let Err(ClickHouseSinkError::InsertFailed { .. }) = result {
            // Column set may have changed underneath us
            self.forget_structure(database, table_name);
        }
        result
    }

    async fn send(
        &self,
        signature: &TableSignature,
        body: Vec<u8>,
    ) -> Result<(), ClickHouseSinkError> {
        let sql = insert_sql(signature);

        let mut request = self.http.post(&self.config.url).query(&[("query", sql.as_str())]);

        if signature.unquoted_name_parts().0.is_none()
            && let Some(ref database) = self.config.database
        {
            request = request.query(&[("database", database.as_str())]);
        }

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClickHouseSinkError::InsertFailed {
            table: signature.name().to_string(),
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }
}

/// `INSERT INTO <name> (<fields>) FORMAT JSONCompactEachRow`
pub(crate) fn insert_sql(signature: &TableSignature) -> String {
    format!(
        "INSERT INTO {} ({}) FORMAT JSONCompactEachRow",
        signature.name(),
        signature.field_list()
    )
}

#[async_trait]
impl Sink for ClickHouseSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, table: &Table) -> Result<(), SinkError> {
        if table.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        match self.write(table).await {
            Ok(()) => {
                let rows = table.row_count();
                self.metrics.table_written(rows as u64);
                tracing::info!(
                    sink = %self.name,
                    table = %table.signature().name(),
                    rows,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "clickhouse insert complete"
                );
                Ok(())
            }
            Err(ClickHouseSinkError::Http(e)) if e.is_timeout() => {
                self.metrics.write_error();
                Err(SinkError::timeout(
                    table.signature().name(),
                    self.config.insert_timeout,
                ))
            }
            Err(e) => {
                self.metrics.write_error();
                Err(e.into())
            }
        }
    }
}
