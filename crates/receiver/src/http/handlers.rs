//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `POST /?table=..&fields=..` - append a JSON array of rows
//! - `GET /health` - Health check

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use rowbatch_manager::{Holder, TableManagerConfig};
use rowbatch_table::TableSignature;

use super::metrics::ReceiverMetrics;

/// Shared state for handlers
pub struct HandlerState {
    pub holder: Arc<Holder>,
    pub metrics: Arc<ReceiverMetrics>,
}

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// Any path - append rows to the table named in the query
///
/// Every failure is answered with a plain-text message; the request is
/// rejected as a whole.
pub async fn ingest(
    State(state): State<Arc<HandlerState>>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    state.metrics.request_received(body.len());

    if method != Method::POST {
        state.metrics.method_not_allowed();
        return (StatusCode::METHOD_NOT_ALLOWED, "HTTP method should be POST").into_response();
    }

    match append(&state, &params, &body).await {
        Ok(()) => {
            state.metrics.request_success();
            StatusCode::OK.into_response()
        }
        Err(message) => {
            state.metrics.request_client_error();
            tracing::debug!(error = %message, "append request rejected");
            (StatusCode::BAD_REQUEST, message).into_response()
        }
    }
}

async fn append(
    state: &HandlerState,
    params: &HashMap<String, String>,
    body: &[u8],
) -> Result<(), String> {
    let signature = TableSignature::new(param(params, "table"), param(params, "fields"));
    signature.validate().map_err(|e| e.to_string())?;

    let synchronous = flag(params, "sync");
    let config = if synchronous {
        state.metrics.sync_request();
        TableManagerConfig::new(Duration::ZERO, 0)
    } else {
        let timeout_ms = uint(params, "timeout_ms").map_err(|e| format!("timeout_ms: {e}"))?;
        let max_rows = uint(params, "max_rows").map_err(|e| format!("max_rows: {e}"))?;
        let config = TableManagerConfig {
            timeout: Duration::from_millis(timeout_ms),
            max_rows: usize::try_from(max_rows).map_err(|e| format!("max_rows: {e}"))?,
            persist: flag(params, "persist"),
        };
        config.validate().map_err(|e| e.to_string())?;
        config
    };

    state
        .holder
        .append(&Arc::new(signature), &config, synchronous, body)
        .await
        .map_err(|e| e.to_string())
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

/// Query flag: `1`, `y`, `yes` or `true` (any case) switch it on
fn flag(params: &HashMap<String, String>, name: &str) -> bool {
    let value = param(params, name);
    ["1", "y", "yes", "true"].iter().any(|on| value.eq_ignore_ascii_case(on))
}

fn uint(params: &HashMap<String, String>, name: &str) -> Result<u64, String> {
    match params.get(name) {
        None => Err("missing value".to_string()),
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| format!("cannot parse {value:?}: {e}")),
    }
}
