//! Pool and startup configuration

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lazy device pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Inactivity threshold after which the reaper evicts a device
    pub idle_timeout_ms: u64,

    /// Process-wide cap on live device actors
    pub max_devices: usize,

    /// Reaper period; defaults to half the idle timeout when absent
    pub reaper_interval_ms: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: defaults::IDLE_TIMEOUT_MS,
            max_devices: defaults::MAX_DEVICES,
            reaper_interval_ms: None,
        }
    }
}

impl PoolConfig {
    /// Idle threshold as a duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Effective reaper period: configured, or half the idle timeout
    pub fn reaper_interval(&self) -> Duration {
        let ms = self
            .reaper_interval_ms
            .unwrap_or_else(|| (self.idle_timeout_ms / 2).max(1));
        Duration::from_millis(ms.max(1))
    }
}

/// Bulk population startup options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupOptions {
    /// Candidate port range, inclusive on both ends
    pub port_range: (u16, u16),

    /// Concurrent creation workers
    pub parallel_workers: usize,

    /// Timeout applied to each individual device creation
    pub per_task_timeout_ms: u64,
}

impl StartupOptions {
    /// Options over a port range with default worker settings
    pub fn with_port_range(start: u16, end: u16) -> Self {
        Self {
            port_range: (start, end),
            ..Default::default()
        }
    }

    /// Per-creation timeout as a duration
    pub fn per_task_timeout(&self) -> Duration {
        Duration::from_millis(self.per_task_timeout_ms)
    }
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            port_range: (30_000, 39_999),
            parallel_workers: defaults::PARALLEL_WORKERS,
            per_task_timeout_ms: defaults::PER_TASK_TIMEOUT_MS,
        }
    }
}
