//! Device fleet runtime
//!
//! Hosts thousands of virtual SNMP devices in one process. The lazy pool
//! materializes a device actor the first time its port is queried,
//! deduplicates concurrent creation, evicts idle devices, enforces a
//! process-wide cap, and recovers from individual actor crashes. Bulk
//! startup pre-warms whole populations across a bounded worker pool.

pub mod actor;
pub mod config;
pub mod error;
pub mod pool;
pub mod profile;
pub mod startup;

// Re-export main types
pub use actor::{DeviceHandle, DeviceInfo, SnmpQuery, SnmpReply, SnmpVarBind};
pub use config::{PoolConfig, StartupOptions};
pub use error::{FleetError, Result};
pub use pool::{LazyDevicePool, PoolStats};
pub use profile::{ProfileProvider, SyntheticProfiles};
pub use startup::{FleetStartup, StartupFailure, StartupResult, StartupStatus};

/// Default configuration values
pub mod defaults {
    /// Idle eviction threshold: thirty minutes
    pub const IDLE_TIMEOUT_MS: u64 = 30 * 60 * 1_000;

    /// Process-wide cap on live device actors
    pub const MAX_DEVICES: usize = 10_000;

    /// Bulk-startup worker pool size
    pub const PARALLEL_WORKERS: usize = 10;

    /// Per-creation timeout during bulk startup
    pub const PER_TASK_TIMEOUT_MS: u64 = 10_000;

    /// Grace period before a shut-down actor is hard-killed
    pub const SHUTDOWN_GRACE_MS: u64 = 1_000;

    /// Device actor mailbox depth
    pub const ACTOR_MAILBOX: usize = 32;

    /// Device actor internal tick period
    pub const TICK_INTERVAL_MS: u64 = 1_000;

    /// Fraction of a requested population that must come up for bulk
    /// startup to report success
    pub const STARTUP_SUCCESS_RATIO: f64 = 0.8;
}
