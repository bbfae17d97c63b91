//! Table manager - batches rows for one table signature
//!
//! ```text
//! append_rows ──lock──▶ active Table ──max_rows reached──▶ wake (depth 1, coalesced)
//!                                                                │
//! run loop:   timer ──┐                                          │
//!             wake  ──┼──▶ flush ──swap──▶ frozen Table ──▶ every sink
//!             stop  ──┘   (final flush, then ack)   │ failure ──▶ InsertErrorLogger
//!                                                   ▼
//!                                              release() ──▶ TablePool
//! ```
//!
//! The run loop is the only thing that flushes a started manager, so flushes
//! of one table never overlap and are delivered in swap order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rowbatch_sinks::{InsertErrorLogger, Sink, SinkError};
use rowbatch_table::{Table, TableError, TablePool, TableSignature};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::TableManagerConfig;
use crate::error::{FlushError, SinkFailure};
use crate::metrics::ManagerMetrics;

/// Completion of a stop request, carrying the final flush's outcome
type StopAck = oneshot::Sender<Result<(), FlushError>>;

/// Resources shared by every table manager of a process
#[derive(Clone)]
pub struct ManagerContext {
    /// Every flushed table goes to all of these
    pub sinks: Arc<[Arc<dyn Sink>]>,

    /// Row storage reuse
    pub pool: Arc<TablePool>,

    /// Record of tables that failed to insert
    pub error_logger: Arc<InsertErrorLogger>,

    pub metrics: Arc<ManagerMetrics>,
}

impl ManagerContext {
    /// Context with a default pool and no error log
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self {
            sinks: sinks.into(),
            pool: Arc::new(TablePool::default()),
            error_logger: Arc::new(InsertErrorLogger::disabled()),
            metrics: Arc::new(ManagerMetrics::new()),
        }
    }

    /// Use a specific row storage pool
    pub fn with_pool(mut self, pool: Arc<TablePool>) -> Self {
        self.pool = pool;
        self
    }

    /// Record failed flushes with this logger
    pub fn with_error_logger(mut self, error_logger: Arc<InsertErrorLogger>) -> Self {
        self.error_logger = error_logger;
        self
    }
}

/// Receiving ends owned by the run loop
struct Control {
    wake_rx: mpsc::Receiver<()>,
    stop_rx: mpsc::Receiver<StopAck>,
}

enum Wakeup {
    Flush,
    Stop(Option<StopAck>),
}

/// Batch scheduler for one table signature
///
/// Rows are appended under a per-manager lock. A spawned run loop flushes
/// the table when its timeout elapses or when `max_rows` is reached,
/// whichever comes first.
pub struct TableManager {
    signature: Arc<TableSignature>,

    /// Table currently receiving rows
    table: Mutex<Table>,

    max_rows: AtomicUsize,
    timeout_ms: AtomicU64,

    context: ManagerContext,

    wake_tx: mpsc::Sender<()>,
    stop_tx: mpsc::Sender<StopAck>,

    /// Taken by the run loop when started
    control: Mutex<Option<Control>>,
}

impl TableManager {
    /// Create a manager; nothing runs until [`start`](Self::start)
    pub fn new(
        signature: Arc<TableSignature>,
        config: &TableManagerConfig,
        context: ManagerContext,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let table = Table::new(Arc::clone(&signature), Arc::clone(&context.pool));

        Self {
            signature,
            table: Mutex::new(table),
            max_rows: AtomicUsize::new(config.max_rows),
            timeout_ms: AtomicU64::new(config.timeout.as_millis() as u64),
            context,
            wake_tx,
            stop_tx,
            control: Mutex::new(Some(Control { wake_rx, stop_rx })),
        }
    }

    /// Spawn the run loop
    ///
    /// Returns `None` if the loop was already started.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let control = self.control.lock().take()?;
        Some(tokio::spawn(Arc::clone(self).run(control)))
    }

    #[inline]
    pub fn signature(&self) -> &Arc<TableSignature> {
        &self.signature
    }

    /// Rows waiting for the next flush
    pub fn row_count(&self) -> usize {
        self.table.lock().row_count()
    }

    #[inline]
    pub fn max_rows(&self) -> usize {
        self.max_rows.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Replace the flush thresholds
    ///
    /// Rows already buffered stay; the new timeout applies from the next
    /// timer the run loop arms.
    pub fn update_config(&self, config: &TableManagerConfig) {
        self.max_rows.store(config.max_rows, Ordering::Relaxed);
        self.timeout_ms
            .store(config.timeout.as_millis() as u64, Ordering::Relaxed);
    }

    /// Append a JSON array of rows, waking the run loop once `max_rows` is reached
    pub fn append_rows(&self, payload: &[u8]) -> Result<(), TableError> {
        let (added, rows) = {
            let mut table = self.table.lock();
            let before = table.row_count();
            table.append_rows(payload)?;
            let rows = table.row_count();
            (rows - before, rows)
        };
        self.context.metrics.record_appended(added as u64);

        if rows >= self.max_rows() {
            tracing::debug!(table = %self.signature.key(), rows, "reached max rows");
            if let Err(TrySendError::Full(())) = self.wake_tx.try_send(()) {
                self.context.metrics.record_wakeup_coalesced();
            }
        }
        Ok(())
    }

    fn max_rows_reached(&self) -> bool {
        self.row_count() >= self.max_rows()
    }

    /// Swap out the table and deliver it to every sink
    ///
    /// Returns the number of rows flushed. An empty table is not delivered.
    /// Failed tables are written to the error log, then discarded.
    pub async fn flush(&self) -> Result<usize, FlushError> {
        let table = {
            let mut active = self.table.lock();
            if active.is_empty() {
                return Ok(0);
            }
            let fresh = Table::new(Arc::clone(&self.signature), Arc::clone(&self.context.pool));
            std::mem::replace(&mut *active, fresh)
        };

        let rows = table.row_count();
        let start = Instant::now();
        let table = Arc::new(table);
        let result = self.deliver(&table).await;
        self.context.metrics.record_flush(rows as u64, result.is_err());

        match result {
            Ok(()) => {
                tracing::info!(
                    table = %self.signature.key(),
                    rows,
                    sinks = self.context.sinks.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "flush complete"
                );
            }
            Err(ref e) => {
                tracing::error!(table = %self.signature.key(), rows, error = %e, "flush failed");
                if let Err(log_err) = self.context.error_logger.log(e, &table) {
                    tracing::warn!(
                        table = %self.signature.key(),
                        error = %log_err,
                        "failed to write insert error log"
                    );
                }
            }
        }

        if let Ok(table) = Arc::try_unwrap(table) {
            table.release();
        }
        result.map(|()| rows)
    }

    /// Run every sink on the frozen table
    ///
    /// A single sink runs inline; several run concurrently, each reading the
    /// shared table through its own iterator.
    async fn deliver(&self, table: &Arc<Table>) -> Result<(), FlushError> {
        let mut failures = Vec::new();

        match &*self.context.sinks {
            [] => {}
            [sink] => {
                if let Err(error) = sink.insert(table).await {
                    failures.push(SinkFailure {
                        sink: sink.name().to_string(),
                        error,
                    });
                }
            }
            sinks => {
                let mut tasks = JoinSet::new();
                for sink in sinks {
                    let sink = Arc::clone(sink);
                    let table = Arc::clone(table);
                    tasks.spawn(async move {
                        let result = sink.insert(&table).await;
                        (sink.name().to_string(), result)
                    });
                }

                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok((_, Ok(()))) => {}
                        Ok((sink, Err(error))) => failures.push(SinkFailure { sink, error }),
                        Err(e) => failures.push(SinkFailure {
                            sink: "unknown".into(),
                            error: SinkError::write(format!("sink task failed: {e}")),
                        }),
                    }
                }
                failures.sort_by(|a, b| a.sink.cmp(&b.sink));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }

    /// Flush what is buffered and end the run loop
    ///
    /// Waits for the run loop to acknowledge, so every row appended before
    /// this call is delivered (or logged as failed) when it returns. A
    /// manager that was never started is flushed inline.
    ///
    /// Stopping the same manager from two tasks at once is not supported.
    pub async fn stop(&self) -> Result<(), FlushError> {
        let key = self.signature.key();
        tracing::info!(table = %key, "stopping table manager");

        let started = self.control.lock().is_none();
        let result = if started {
            let (ack_tx, ack_rx) = oneshot::channel();
            match self.stop_tx.send(ack_tx).await {
                Ok(()) => match ack_rx.await {
                    Ok(result) => result,
                    // Loop went away without answering
                    Err(_) => self.flush().await.map(drop),
                },
                Err(_) => self.flush().await.map(drop),
            }
        } else {
            self.flush().await.map(drop)
        };

        tracing::info!(table = %key, "stopped table manager");
        result
    }

    async fn run(self: Arc<Self>, mut control: Control) {
        loop {
            let wakeup = self.wait(&mut control).await;
            let result = self.flush().await.map(drop);

            if let Wakeup::Stop(ack) = wakeup {
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
                break;
            }
        }
        tracing::debug!(table = %self.signature.key(), "table manager loop exited");
    }

    /// Block until the next flush is due
    async fn wait(&self, control: &mut Control) -> Wakeup {
        let timer = tokio::time::sleep(self.timeout());
        tokio::pin!(timer);

        loop {
            tokio::select! {
                () = &mut timer => return Wakeup::Flush,
                Some(()) = control.wake_rx.recv() => {
                    // A flush may have emptied the table since the signal was sent
                    if self.max_rows_reached() {
                        return Wakeup::Flush;
                    }
                }
                ack = control.stop_rx.recv() => return Wakeup::Stop(ack),
            }
        }
    }
}

impl std::fmt::Debug for TableManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableManager")
            .field("table", &self.signature.key())
            .field("max_rows", &self.max_rows())
            .field("timeout", &self.timeout())
            .finish()
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
