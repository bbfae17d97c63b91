//! Lock-free pool of row storage
//!
//! Every swap in a table manager creates a fresh [`Table`](crate::Table), and
//! every flushed table gives its storage back. Recycling the backing `Vec`s
//! keeps steady-state ingestion free of large allocations.
//!
//! The pool is an explicit component: construct one at startup and share it
//! (as `Arc<TablePool>`) with everything that creates tables.
//!
//! ```ignore
//! let pool = Arc::new(TablePool::new(64, 10_000, 100_000));
//! let mut table = Table::new(signature, Arc::clone(&pool));
//! table.append_rows(br#"[[1,2]]"#)?;
//! table.release(); // storage goes back to the pool
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::ArrayQueue;
use serde_json::Value;

/// Default number of pooled buffers
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Default capacity, in cells, of a freshly allocated buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Default admission ceiling, in cells; larger buffers are discarded
pub const DEFAULT_MAX_BUFFER_LEN: usize = DEFAULT_BUFFER_CAPACITY * 10;

/// Bounded, lock-free pool of cell buffers
pub struct TablePool {
    /// Available buffers
    queue: ArrayQueue<Vec<Value>>,

    /// Capacity of newly allocated buffers
    buffer_capacity: usize,

    /// Buffers that grew beyond this many cells are not retained
    max_buffer_len: usize,

    metrics: TablePoolMetrics,
}

/// Pool usage counters
#[derive(Debug, Default)]
pub struct TablePoolMetrics {
    /// Buffers served from the pool
    pub hits: AtomicU64,

    /// Buffers allocated because the pool was empty
    pub misses: AtomicU64,

    /// Buffers taken back into the pool
    pub returns: AtomicU64,

    /// Buffers dropped because the pool was full
    pub drops: AtomicU64,

    /// Buffers dropped because they exceeded the admission ceiling
    pub oversized: AtomicU64,
}

impl TablePoolMetrics {
    pub const fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
            oversized: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_drop(&self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_oversized(&self) {
        self.oversized.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            oversized: self.oversized.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pool metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
    pub oversized: u64,
}

impl PoolMetricsSnapshot {
    /// Fraction of requests served from the pool (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl TablePool {
    /// Create an empty pool
    ///
    /// Buffers are allocated lazily on first use rather than up front, so an
    /// idle process with many configured slots stays small.
    ///
    /// * `pool_size` - maximum number of idle buffers retained
    /// * `buffer_capacity` - cells preallocated for each new buffer
    /// * `max_buffer_len` - buffers whose capacity exceeds this are discarded
    pub fn new(pool_size: usize, buffer_capacity: usize, max_buffer_len: usize) -> Self {
        Self {
            queue: ArrayQueue::new(pool_size.max(1)),
            buffer_capacity,
            max_buffer_len: max_buffer_len.max(buffer_capacity),
            metrics: TablePoolMetrics::new(),
        }
    }

    /// Take an empty buffer, allocating one if the pool is empty
    #[inline]
    pub fn get(&self) -> Vec<Value> {
        match self.queue.pop() {
            Some(buf) => {
                self.metrics.record_hit();
                buf
            }
            None => {
                self.metrics.record_miss();
                Vec::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Give a buffer back
    ///
    /// The buffer is cleared. Buffers above the admission ceiling, and
    /// buffers arriving while the pool is full, are dropped.
    #[inline]
    pub fn put(&self, mut buf: Vec<Value>) {
        if buf.capacity() > self.max_buffer_len {
            self.metrics.record_oversized();
            return;
        }

        buf.clear();
        match self.queue.push(buf) {
            Ok(()) => self.metrics.record_return(),
            Err(_) => self.metrics.record_drop(),
        }
    }

    /// Idle buffers currently held
    #[inline]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Maximum number of idle buffers
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    #[inline]
    pub fn max_buffer_len(&self) -> usize {
        self.max_buffer_len
    }

    #[inline]
    pub fn metrics(&self) -> &TablePoolMetrics {
        &self.metrics
    }
}

impl Default for TablePool {
    fn default() -> Self {
        Self::new(
            DEFAULT_POOL_SIZE,
            DEFAULT_BUFFER_CAPACITY,
            DEFAULT_MAX_BUFFER_LEN,
        )
    }
}

impl std::fmt::Debug for TablePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePool")
            .field("available", &self.available())
            .field("capacity", &self.capacity())
            .field("buffer_capacity", &self.buffer_capacity)
            .field("max_buffer_len", &self.max_buffer_len)
            .finish()
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
