//! HTTP Receiver - row ingestion over HTTP
//!
//! # Endpoints
//!
//! - `POST /?table=<name>&fields=<a,b,c>&timeout_ms=<ms>&max_rows=<n>` - append rows
//! - `GET /health` - Health check
//!
//! The path is ignored for appends. The body is a JSON array of rows, each
//! row an array with one value per field:
//!
//! ```text
//! POST /?table=db.events&fields=id,name&timeout_ms=1000&max_rows=500
//!
//! [[1,"a"],[2,"b"]]
//! ```
//!
//! Optional flags:
//!
//! - `sync=1` - deliver to every sink before answering; batching parameters are ignored
//! - `persist=1` - rejected, persistence is not supported
//!
//! Failures are answered with `400` and the error text, non-POST requests with
//! `405`, oversized bodies with `413`.

mod handlers;
mod metrics;


use std::future::IntoFuture;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use rowbatch_config::HttpReceiverConfig;
use rowbatch_manager::Holder;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use metrics::{ReceiverMetrics, ReceiverMetricsSnapshot};

use handlers::{HandlerState, health_check, ingest};

use crate::ReceiverError;

/// HTTP receiver feeding a table manager holder
pub struct HttpReceiver {
    name: String,
    config: HttpReceiverConfig,
    holder: Arc<Holder>,
    metrics: Arc<ReceiverMetrics>,
}

impl HttpReceiver {
    /// Create a new HTTP receiver
    pub fn new(name: impl Into<String>, config: HttpReceiverConfig, holder: Arc<Holder>) -> Self {
        Self {
            name: name.into(),
            config,
            holder,
            metrics: Arc::new(ReceiverMetrics::new()),
        }
    }

    /// Receiver name from the config file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &ReceiverMetrics {
        &self.metrics
    }

    /// Run the HTTP receiver
    ///
    /// Binds to the configured address and serves requests until `cancel`
    /// fires. Returns an error on bind failure, on server failure, or when
    /// in-flight requests outlive the shutdown timeout.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ReceiverError> {
        let listener = TcpListener::bind(&self.config.bind)
            .await
            .map_err(|e| ReceiverError::Bind {
                address: self.config.bind.clone(),
                source: e,
            })?;

        self.run_with_listener(listener, cancel).await
    }

    /// Run on an already bound listener
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ReceiverError> {
        let address = listener
            .local_addr()
            .map_or_else(|_| self.config.bind.clone(), |addr| addr.to_string());

        tracing::info!(
            receiver = %self.name,
            address = %address,
            "HTTP receiver listening"
        );

        let state = Arc::new(HandlerState {
            holder: Arc::clone(&self.holder),
            metrics: Arc::clone(&self.metrics),
        });
        let app = build_router(state, self.config.max_payload_size);

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(cancel.clone()))
            .into_future();
        tokio::pin!(server);

        let result = tokio::select! {
            result = &mut server => result.map_err(|e| ReceiverError::Http(e.to_string())),
            _ = cancel.cancelled() => {
                match tokio::time::timeout(self.config.shutdown_timeout, &mut server).await {
                    Ok(result) => result.map_err(|e| ReceiverError::Http(e.to_string())),
                    Err(_) => Err(ReceiverError::ShutdownTimeout {
                        name: self.name.clone(),
                        timeout: self.config.shutdown_timeout,
                    }),
                }
            }
        };

        tracing::info!(
            receiver = %self.name,
            requests = self.metrics.snapshot().requests_total,
            "HTTP receiver stopped"
        );

        result
    }
}

/// Build the axum router
pub(crate) fn build_router(state: Arc<HandlerState>, max_payload_size: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(ingest)
        .layer(DefaultBodyLimit::max(max_payload_size))
        .with_state(state)
}

/// Shutdown signal future
async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
}
