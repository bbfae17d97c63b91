//! Tests for common sink types and utilities

use std::time::Duration;

use crate::{SinkError, SinkMetrics};

#[test]
fn test_metrics_new() {
    let snapshot = SinkMetrics::new().snapshot();

    assert_eq!(snapshot.tables_written, 0);
    assert_eq!(snapshot.rows_written, 0);
    assert_eq!(snapshot.write_errors, 0);
}

#[test]
fn test_metrics_table_written() {
    let metrics = SinkMetrics::new();

    metrics.table_written(100);
    metrics.table_written(250);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.tables_written, 2);
    assert_eq!(snapshot.rows_written, 350);
}

#[test]
fn test_metrics_write_error() {
    let metrics = SinkMetrics::new();

    metrics.write_error();
    metrics.write_error();

    assert_eq!(metrics.snapshot().write_errors, 2);
}

#[test]
fn test_error_init() {
    let err = SinkError::init("clickhouse_main", "connection refused");
    let msg = err.to_string();
    assert!(msg.contains("clickhouse_main"));
    assert!(msg.contains("connection refused"));
}

#[test]
fn test_error_config() {
    let err = SinkError::config("expected clickhouse config");
    assert!(err.to_string().contains("configuration error"));
}

#[test]
fn test_error_timeout() {
    let err = SinkError::timeout("db.events", Duration::from_secs(3));
    let msg = err.to_string();
    assert!(msg.contains("db.events"));
    assert!(msg.contains("3s"));
}

#[test]
fn test_error_from_backend() {
    let err: SinkError = crate::ClickHouseSinkError::NoDatabase {
        table: "events".into(),
    }
    .into();
    assert!(matches!(err, SinkError::ClickHouse(_)));
    assert!(err.to_string().contains("events"));
}
