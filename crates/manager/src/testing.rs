//! Sinks for exercising table managers

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rowbatch_sinks::{Sink, SinkError};
use rowbatch_table::{Table, TableSignature, Value};

/// Records every row it receives
pub struct CaptureSink {
    name: String,
    rows: Mutex<Vec<Vec<Value>>>,
    inserts: AtomicUsize,
}

impl CaptureSink {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            rows: Mutex::new(Vec::new()),
            inserts: AtomicUsize::new(0),
        })
    }

    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.rows.lock().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, table: &Table) -> Result<(), SinkError> {
        let mut rows = self.rows.lock();
        rows.extend(table.rows().map(<[Value]>::to_vec));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails every insert with a fixed message
pub struct FailingSink {
    name: String,
    message: String,
}

impl FailingSink {
    pub fn new(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            message: message.into(),
        })
    }
}

#[async_trait]
impl Sink for FailingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, _table: &Table) -> Result<(), SinkError> {
        Err(SinkError::write(self.message.clone()))
    }
}

/// Never finishes an insert
pub struct StuckSink;

#[async_trait]
impl Sink for StuckSink {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn insert(&self, _table: &Table) -> Result<(), SinkError> {
        std::future::pending().await
    }
}

pub fn signature(name: &str, fields: &str) -> Arc<TableSignature> {
    Arc::new(TableSignature::new(name, fields))
}

/// Wait until `done` holds, checking every few milliseconds
pub async fn eventually(limit: std::time::Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if done() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    done()
}
