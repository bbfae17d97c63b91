//! HTTP client for the receiver protocol

use std::time::Duration;

use serde::Serialize;

use crate::{ClientError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the receiver, e.g. `http://127.0.0.1:8124`
    pub server_address: String,

    /// Timeout for a whole request, including a synchronous flush
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config with the default timeout
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Where the rows go and how they are batched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Table name, optionally `database.table`
    pub table: String,
    /// Comma-separated field list
    pub fields: String,
    /// Longest time rows wait on the server before a flush
    pub timeout_ms: u64,
    /// Row count that triggers an early flush
    pub max_rows: u64,
    /// Deliver before answering, ignoring the batching parameters
    pub sync: bool,
    /// Ask the server to persist unflushed rows
    pub persist: bool,
}

impl Request {
    /// Request batched on the server
    pub fn buffered(
        table: impl Into<String>,
        fields: impl Into<String>,
        timeout_ms: u64,
        max_rows: u64,
    ) -> Self {
        Self {
            table: table.into(),
            fields: fields.into(),
            timeout_ms,
            max_rows,
            sync: false,
            persist: false,
        }
    }

    /// Request delivered to the sinks before the server answers
    pub fn sync(table: impl Into<String>, fields: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: fields.into(),
            timeout_ms: 0,
            max_rows: 0,
            sync: true,
            persist: false,
        }
    }

    /// Query parameters for this request
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("table", self.table.clone()), ("fields", self.fields.clone())];
        if self.sync {
            query.push(("sync", "1".into()));
            return query;
        }
        query.push(("timeout_ms", self.timeout_ms.to_string()));
        query.push(("max_rows", self.max_rows.to_string()));
        if self.persist {
            query.push(("persist", "1".into()));
        }
        query
    }
}

/// Client for a rowbatch HTTP receiver
///
/// Holds a connection pool; clone it or share it instead of creating one
/// per request.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    url: String,
}

impl Client {
    /// Create a client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: format!("{}/", config.server_address.trim_end_matches('/')),
        })
    }

    /// Send rows to the server
    ///
    /// `rows` must serialize to a JSON array of rows, each row an array
    /// with one value per field.
    pub async fn send<R>(&self, request: &Request, rows: &R) -> Result<()>
    where
        R: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(rows)?;

        let response = self
            .http
            .post(&self.url)
            .query(&request.query())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Send a single request with a throwaway client
///
/// Use [`Client`] when sending more than occasionally.
pub async fn send<R>(config: ClientConfig, request: &Request, rows: &R) -> Result<()>
where
    R: Serialize + ?Sized,
{
    Client::new(config)?.send(request, rows).await
}
