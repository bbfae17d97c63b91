//! Table manager tests
//!
//! Flushing, thresholds, stop semantics and fan-out to several sinks.

use std::sync::Arc;
use std::time::Duration;

use rowbatch_config::ErrorLogConfig;
use rowbatch_sinks::{InsertErrorLogger, Sink};
use rowbatch_table::{TableError, TablePool};
use serde_json::json;
use tempfile::TempDir;

use crate::testing::{CaptureSink, FailingSink, eventually, signature};
use crate::{ManagerContext, TableManager, TableManagerConfig};

fn config(timeout_ms: u64, max_rows: usize) -> TableManagerConfig {
    TableManagerConfig::new(Duration::from_millis(timeout_ms), max_rows)
}

fn manager_with(sinks: Vec<Arc<dyn Sink>>, config: &TableManagerConfig) -> TableManager {
    TableManager::new(signature("db.events", "a,b"), config, ManagerContext::new(sinks))
}

// ============================================================================
// Append and flush
// ============================================================================

#[tokio::test]
async fn test_flush_delivers_rows_in_order() {
    let capture = CaptureSink::new("capture");
    let manager = manager_with(vec![capture.clone() as Arc<dyn Sink>], &config(60_000, 1000));

    manager.append_rows(b"[[1,2],[3,4]]").unwrap();
    manager.append_rows(br#"[["x",null]]"#).unwrap();
    assert_eq!(manager.row_count(), 3);

    let flushed = manager.flush().await.unwrap();

    assert_eq!(flushed, 3);
    assert_eq!(manager.row_count(), 0);
    assert_eq!(
        capture.rows(),
        vec![
            vec![json!(1), json!(2)],
            vec![json!(3), json!(4)],
            vec![json!("x"), json!(null)],
        ]
    );
}

#[tokio::test]
async fn test_wrong_row_width_leaves_table_unchanged() {
    let capture = CaptureSink::new("capture");
    let manager = TableManager::new(
        signature("db.events", "a,b,c"),
        &config(60_000, 1000),
        ManagerContext::new(vec![capture.clone() as Arc<dyn Sink>]),
    );

    let err = manager.append_rows(b"[[1,2]]").unwrap_err();

    assert!(matches!(err, TableError::RowWidthMismatch { .. }));
    assert_eq!(manager.row_count(), 0);
}

#[tokio::test]
async fn test_flush_of_empty_table_calls_no_sink() {
    let capture = CaptureSink::new("capture");
    let manager = manager_with(vec![capture.clone() as Arc<dyn Sink>], &config(60_000, 1000));

    assert_eq!(manager.flush().await.unwrap(), 0);
    assert_eq!(capture.inserts(), 0);
}

#[tokio::test]
async fn test_flushed_storage_returns_to_pool() {
    let pool = Arc::new(TablePool::new(4, 16, 1024));
    let context = ManagerContext::new(vec![CaptureSink::new("capture") as Arc<dyn Sink>])
        .with_pool(Arc::clone(&pool));
    let manager = TableManager::new(signature("t", "a"), &config(60_000, 1000), context);

    manager.append_rows(b"[[1],[2]]").unwrap();
    manager.flush().await.unwrap();

    assert_eq!(pool.metrics().snapshot().returns, 1);
    assert_eq!(pool.available(), 1);
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_sink_gets_every_row() {
    let sinks: Vec<Arc<CaptureSink>> = (0..3).map(|i| CaptureSink::new(&format!("s{i}"))).collect();
    let manager = manager_with(
        sinks.iter().map(|s| s.clone() as Arc<dyn Sink>).collect(),
        &config(60_000, 1000),
    );

    manager.append_rows(b"[[1,2],[3,4],[5,6]]").unwrap();
    manager.flush().await.unwrap();

    for sink in &sinks {
        assert_eq!(sink.row_count(), 3);
        assert_eq!(sink.rows()[2], vec![json!(5), json!(6)]);
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_successful_sink() {
    let capture = CaptureSink::new("a");
    let manager = manager_with(
        vec![capture.clone() as Arc<dyn Sink>, FailingSink::new("b", "boom")],
        &config(60_000, 1000),
    );

    manager.append_rows(b"[[1,2],[3,4]]").unwrap();
    let err = manager.flush().await.unwrap_err();

    assert!(err.to_string().contains("boom"));
    assert_eq!(err.failed_sinks().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(capture.rows(), vec![vec![json!(1), json!(2)], vec![json!(3), json!(4)]]);
    // Failed batches are not requeued
    assert_eq!(manager.row_count(), 0);
}

#[tokio::test]
async fn test_every_failure_is_reported() {
    let manager = manager_with(
        vec![FailingSink::new("a", "first") as Arc<dyn Sink>, FailingSink::new("b", "second")],
        &config(60_000, 1000),
    );

    manager.append_rows(b"[[1,2]]").unwrap();
    let err = manager.flush().await.unwrap_err();

    assert_eq!(err.failures.len(), 2);
    assert!(err.to_string().contains("first"));
    assert!(err.to_string().contains("second"));
}

#[tokio::test]
async fn test_failed_flush_is_written_to_error_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("errors.jsonl");
    let logger = InsertErrorLogger::from_config(&ErrorLogConfig {
        path: Some(path.clone()),
        pretty_print: false,
    })
    .unwrap();

    let failing = FailingSink::new("db", "table is gone") as Arc<dyn Sink>;
    let context = ManagerContext::new(vec![failing]).with_error_logger(Arc::new(logger));
    let manager = TableManager::new(signature("db.events", "a,b"), &config(60_000, 1000), context);

    manager.append_rows(b"[[1,2]]").unwrap();
    manager.flush().await.unwrap_err();

    let contents = std::fs::read_to_string(&path).unwrap();
    let record: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
    assert!(record["error"].as_str().unwrap().contains("table is gone"));
    assert_eq!(record["table"], "db.events");
    assert_eq!(record["fields"], "a,b");
    assert_eq!(record["rows"], json!([[1, 2]]));
}

// ============================================================================
// Run loop
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_max_rows_flushes_before_timeout() {
    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(
        vec![capture.clone() as Arc<dyn Sink>],
        &config(60_000, 1000),
    ));
    manager.start().unwrap();

    let mut handles = Vec::new();
    for caller in 0..50 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            for i in 0..20 {
                let payload = serde_json::to_vec(&json!([[caller, i]])).unwrap();
                manager.append_rows(&payload).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let flushed = eventually(Duration::from_secs(2), || capture.row_count() == 1000).await;
    assert!(flushed, "got {} rows", capture.row_count());
}

#[tokio::test]
async fn test_timeout_flushes_without_reaching_max_rows() {
    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(vec![capture.clone() as Arc<dyn Sink>], &config(50, 1000)));
    manager.start().unwrap();

    manager.append_rows(b"[[1,2]]").unwrap();

    assert!(eventually(Duration::from_secs(2), || capture.row_count() == 1).await);
    assert_eq!(manager.row_count(), 0);
}

#[tokio::test]
async fn test_update_config_lowers_threshold() {
    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(
        vec![capture.clone() as Arc<dyn Sink>],
        &config(60_000, 1000),
    ));
    manager.start().unwrap();

    manager.update_config(&config(60_000, 2));
    assert_eq!(manager.max_rows(), 2);

    manager.append_rows(b"[[1,2]]").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(capture.row_count(), 0);

    manager.append_rows(b"[[3,4]]").unwrap();
    assert!(eventually(Duration::from_secs(2), || capture.row_count() == 2).await);
}

#[tokio::test]
async fn test_wakeups_coalesce() {
    let manager = manager_with(
        vec![CaptureSink::new("capture") as Arc<dyn Sink>],
        &config(60_000, 1),
    );

    // Not started, so the first signal stays pending
    manager.append_rows(b"[[1,2]]").unwrap();
    manager.append_rows(b"[[3,4]]").unwrap();
    manager.append_rows(b"[[5,6]]").unwrap();

    let snapshot = manager.context.metrics.snapshot();
    assert_eq!(snapshot.wakeups_coalesced, 2);
    assert_eq!(snapshot.rows_appended, 3);
}

#[tokio::test]
async fn test_start_only_once() {
    let manager = Arc::new(manager_with(
        vec![CaptureSink::new("capture") as Arc<dyn Sink>],
        &config(60_000, 10),
    ));
    assert!(manager.start().is_some());
    assert!(manager.start().is_none());
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test]
async fn test_stop_flushes_buffered_rows() {
    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(
        vec![capture.clone() as Arc<dyn Sink>],
        &config(60_000, 1000),
    ));
    let handle = manager.start().unwrap();

    manager.append_rows(b"[[1,2],[3,4]]").unwrap();
    manager.stop().await.unwrap();

    assert_eq!(capture.row_count(), 2);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_stop_without_start_flushes_inline() {
    let capture = CaptureSink::new("capture");
    let manager = manager_with(vec![capture.clone() as Arc<dyn Sink>], &config(60_000, 1000));

    manager.append_rows(b"[[1,2]]").unwrap();
    manager.stop().await.unwrap();

    assert_eq!(capture.row_count(), 1);
}

#[tokio::test]
async fn test_stop_reports_final_flush_failure() {
    let manager = Arc::new(manager_with(
        vec![FailingSink::new("db", "boom") as Arc<dyn Sink>],
        &config(60_000, 1000),
    ));
    manager.start().unwrap();

    manager.append_rows(b"[[1,2]]").unwrap();
    let err = manager.stop().await.unwrap_err();

    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_rows_appended_after_stop_are_not_lost() {
    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(
        vec![capture.clone() as Arc<dyn Sink>],
        &config(60_000, 1000),
    ));
    manager.start().unwrap();

    manager.stop().await.unwrap();
    manager.append_rows(b"[[1,2]]").unwrap();
    manager.stop().await.unwrap();

    assert_eq!(capture.row_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_delivered_exactly_once() {
    const CALLERS: i64 = 200;

    let capture = CaptureSink::new("capture");
    let manager = Arc::new(manager_with(vec![capture.clone() as Arc<dyn Sink>], &config(20, 7)));
    manager.start().unwrap();

    let mut handles = Vec::new();
    for caller in 0..CALLERS {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            let payload = serde_json::to_vec(&json!([[caller, "row"]])).unwrap();
            manager.append_rows(&payload).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    manager.stop().await.unwrap();

    let mut seen: Vec<i64> = capture
        .rows()
        .iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..CALLERS).collect::<Vec<_>>());
}
