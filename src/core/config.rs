//! # Global queue configuration.
//!
//! [`Config`] defines the queue's behavior: pool size, fan-out address,
//! store strategy, bus capacity, startup handshake window, and shutdown
//! grace period.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use taskfan::{Config, StoreStrategy};
//!
//! let mut cfg = Config::default();
//! cfg.pool_size = 4;
//! cfg.grace = Duration::from_secs(10);
//! cfg.store = StoreStrategy::Memory;
//!
//! assert_eq!(cfg.pool_size_clamped(), 4);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::store::Retention;

/// Which durable store strategy the queue builds at startup.
///
/// All three implement the same persistence contract; they differ only in
/// where the pending record lives between dispatch and completion.
#[derive(Debug, Clone)]
pub enum StoreStrategy {
    /// File-backed records under `root`, durable across process restarts.
    FileSystem {
        /// Directory holding pending records and outcome archives.
        root: PathBuf,
        /// Archive or purge records once terminally tagged.
        retention: Retention,
    },
    /// Records held in a process-lifetime map. Nothing survives a restart,
    /// so orphan recovery never finds anything.
    Memory,
    /// No side storage at all: the encoded payload travels inside the
    /// dispatch message itself.
    Inline,
}

impl Default for StoreStrategy {
    /// File-backed under `./task_q`, archiving terminally tagged records.
    fn default() -> Self {
        StoreStrategy::FileSystem {
            root: PathBuf::from("task_q"),
            retention: Retention::Archive,
        }
    }
}

/// Global configuration for the queue, device, and worker pool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of workers (and slots). Clamped to `1..=9999`; the wire format
    /// addresses slots with a 4-digit prefix.
    pub pool_size: usize,
    /// Label of the internal fan-out bind point, carried in events and
    /// errors for diagnostics.
    pub fanout_addr: String,
    /// Store strategy built at startup (unless the builder injects one).
    pub store: StoreStrategy,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Maximum time to wait for each worker's ready signal at startup.
    pub ready_timeout: Duration,
    /// Maximum time to wait for graceful shutdown before abandoning
    /// still-busy workers.
    pub grace: Duration,
}

impl Config {
    /// Pool size clamped into the addressable slot range `1..=9999`.
    pub fn pool_size_clamped(&self) -> usize {
        self.pool_size.clamp(1, 9999)
    }
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `pool_size = 16`
    /// - `fanout_addr = "inproc://task_q"`
    /// - `store = StoreStrategy::FileSystem` under `./task_q`, archiving
    /// - `bus_capacity = 1024`
    /// - `ready_timeout = 5s`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            pool_size: 16,
            fanout_addr: "inproc://task_q".to_string(),
            store: StoreStrategy::default(),
            bus_capacity: 1024,
            ready_timeout: Duration::from_secs(5),
            grace: Duration::from_secs(30),
        }
    }
}
