//! Table manager holder settings
//!
//! Controls idle eviction, bounded shutdown and the shared row storage pool.

use serde::Deserialize;
use std::time::Duration;

/// Settings for the table manager holder
///
/// # Example
///
/// ```toml
/// [holder]
/// idle_timeout = "10s"
/// stop_timeout = "5s"
/// pool_size = 64
/// pool_buffer_capacity = 10000
/// pool_max_buffer_len = 100000
/// max_concurrent_sync = 0
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HolderConfig {
    /// Managers untouched for longer than this are stopped and removed.
    /// Also the interval of the eviction scan.
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// How long shutdown waits for each manager's final flush
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,

    /// Idle row buffers kept for reuse
    /// Default: 64
    pub pool_size: usize,

    /// Cells preallocated for each new row buffer
    /// Default: 10000
    pub pool_buffer_capacity: usize,

    /// Row buffers grown beyond this many cells are not reused
    /// Default: 100000
    pub pool_max_buffer_len: usize,

    /// Upper bound on synchronous requests flushing at once (0 = unbounded)
    /// Default: 0
    pub max_concurrent_sync: usize,
}

impl Default for HolderConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
            pool_size: 64,
            pool_buffer_capacity: 10_000,
            pool_max_buffer_len: 100_000,
            max_concurrent_sync: 0,
        }
    }
}
