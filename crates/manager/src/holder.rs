//! Holder - registry of table managers
//!
//! Routes appends to the manager owning each table signature, creating
//! managers on first use and retiring them when idle.
//!
//! ```text
//! append(sig) ──▶ registry lock ──▶ { key → TableManager, key → last access }
//!                                          │ idle > idle_timeout
//!                                          ▼
//!                               removed, then stopped in background
//! ```
//!
//! Synchronous appends skip the registry: each gets a throwaway manager that
//! is flushed in its own task before the call returns. Dropping the caller
//! stops the wait, never the flush.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rowbatch_config::HolderConfig;
use rowbatch_table::TableSignature;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::TableManagerConfig;
use crate::error::{ManagerError, Result};
use crate::manager::{ManagerContext, TableManager};
use crate::metrics::{ManagerMetrics, MetricsSnapshot};

#[derive(Default)]
struct Registry {
    managers: HashMap<String, Arc<TableManager>>,
    last_access: HashMap<String, Instant>,
}

/// Creates, finds and retires table managers
pub struct Holder {
    context: ManagerContext,

    /// Both maps change together under this lock
    registry: Mutex<Registry>,

    idle_timeout: Duration,
    stop_timeout: Duration,

    /// Bounds concurrent synchronous flushes when set
    sync_permits: Option<Arc<Semaphore>>,
}

impl std::fmt::Debug for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Holder")
            .field("managers", &self.len())
            .field("idle_timeout", &self.idle_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .finish()
    }
}

impl Holder {
    pub fn new(context: ManagerContext, config: &HolderConfig) -> Self {
        let sync_permits = (config.max_concurrent_sync > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_sync)));

        Self {
            context,
            registry: Mutex::new(Registry::default()),
            idle_timeout: config.idle_timeout,
            stop_timeout: config.stop_timeout,
            sync_permits,
        }
    }

    /// Counters shared with every manager
    pub fn metrics(&self) -> &ManagerMetrics {
        &self.context.metrics
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.context.metrics.snapshot()
    }

    /// Number of registered managers
    pub fn len(&self) -> usize {
        self.registry.lock().managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered manager for a signature key
    pub fn manager(&self, key: &str) -> Option<Arc<TableManager>> {
        self.registry.lock().managers.get(key).cloned()
    }

    /// Find the manager for a signature, creating and starting it if needed
    ///
    /// An existing manager takes the new config.
    pub fn get_or_create(
        &self,
        signature: &Arc<TableSignature>,
        config: &TableManagerConfig,
    ) -> Arc<TableManager> {
        let key = signature.key();

        let (manager, created) = {
            let mut registry = self.registry.lock();
            let existing = registry.managers.get(key).cloned();
            let entry = match existing {
                Some(manager) => (manager, false),
                None => {
                    tracing::info!(table = %key, "new table");
                    let manager = Arc::new(TableManager::new(
                        Arc::clone(signature),
                        config,
                        self.context.clone(),
                    ));
                    manager.start();
                    registry.managers.insert(key.to_string(), Arc::clone(&manager));
                    self.context.metrics.record_manager_created();
                    (manager, true)
                }
            };
            registry.last_access.insert(key.to_string(), Instant::now());
            entry
        };

        if !created {
            manager.update_config(config);
        }
        manager
    }

    /// Append rows for a table
    ///
    /// Buffered appends return once the rows are in the manager. Synchronous
    /// appends return once the rows have been delivered to every sink, and
    /// report sink failures.
    pub async fn append(
        &self,
        signature: &Arc<TableSignature>,
        config: &TableManagerConfig,
        synchronous: bool,
        payload: &[u8],
    ) -> Result<()> {
        if !synchronous {
            return Ok(self.get_or_create(signature, config).append_rows(payload)?);
        }

        let permit = match self.sync_permits {
            Some(ref permits) => Arc::clone(permits).acquire_owned().await.ok(),
            None => None,
        };

        let manager = TableManager::new(Arc::clone(signature), config, self.context.clone());
        manager.append_rows(payload)?;

        // Sink writes must run to completion even if the caller goes away
        let metrics = Arc::clone(&self.context.metrics);
        let flush = tokio::spawn(async move {
            let _permit = permit;
            let result = manager.flush().await;
            if result.is_ok() {
                metrics.record_sync_flush();
            }
            result
        });

        match flush.await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ManagerError::SyncTask(e)),
        }
    }

    /// Remove managers idle for longer than the idle timeout
    ///
    /// Removed managers are stopped in the background; an append arriving
    /// meanwhile creates a new manager. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();

        let evicted: Vec<(String, Arc<TableManager>)> = {
            let mut guard = self.registry.lock();
            let registry = &mut *guard;
            let expired: Vec<String> = registry
                .last_access
                .iter()
                .filter(|(_, last)| now.duration_since(**last) > self.idle_timeout)
                .map(|(key, _)| key.clone())
                .collect();

            expired
                .into_iter()
                .filter_map(|key| {
                    registry.last_access.remove(&key);
                    registry.managers.remove(&key).map(|manager| (key, manager))
                })
                .collect()
        };

        for (key, manager) in &evicted {
            tracing::info!(table = %key, "evicting idle table manager");
            let manager = Arc::clone(manager);
            tokio::spawn(async move {
                if let Err(e) = manager.stop().await {
                    tracing::error!(
                        table = %manager.signature().key(),
                        error = %e,
                        "final flush failed"
                    );
                }
            });
        }

        self.context.metrics.record_evicted(evicted.len() as u64);
        evicted.len()
    }

    /// Scan for idle managers every `idle_timeout` until cancelled
    pub fn spawn_eviction(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let holder = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(holder.idle_timeout);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        holder.evict_idle();
                    }
                }
            }
            tracing::debug!("idle eviction stopped");
        })
    }

    /// Stop every registered manager, each bounded by the stop timeout
    ///
    /// Managers stop concurrently. One that misses the deadline is reported
    /// as [`ManagerError::StopTimeout`] and left running; the others are not
    /// held up by it. Final flush failures are reported too.
    pub async fn stop_all(&self) -> Vec<ManagerError> {
        let managers = {
            let mut registry = self.registry.lock();
            registry.last_access.clear();
            std::mem::take(&mut registry.managers)
        };

        let mut tasks = JoinSet::new();
        for (key, manager) in managers {
            let stop_timeout = self.stop_timeout;
            tasks.spawn(async move {
                match tokio::time::timeout(stop_timeout, manager.stop()).await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(ManagerError::Flush(e)),
                    Err(_) => Some(ManagerError::StopTimeout { table: key }),
                }
            });
        }

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(err)) => {
                    if let ManagerError::StopTimeout { ref table } = err {
                        tracing::warn!(table = %table, "table manager didn't stop in time");
                        self.context.metrics.record_stop_timeout();
                    }
                    errors.push(err);
                }
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "table manager stop task failed"),
            }
        }
        errors
    }
}

#[cfg(test)]
#[path = "holder_test.rs"]
mod holder_test;
