//! Lazy device pool
//!
//! Registry, factory, and reaper for per-port device actors. Devices
//! materialize on first query, concurrent creation is deduplicated per
//! port, idle devices are evicted past the idle timeout, and a crashed
//! actor's registry entry is pruned so the next query gets a fresh one.

use crate::actor::{spawn_device, DeviceHandle};
use crate::config::PoolConfig;
use crate::defaults;
use crate::error::{FleetError, Result};
use crate::profile::{ProfileProvider, SyntheticProfiles};
use dashmap::DashMap;
use device_core::{DeviceType, PortAssignments};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pool counters; lifetime counters are monotonic
///
/// Individual increments may be observed out of order across threads, so
/// readers must not assume `devices_created_total == active_count +
/// devices_cleaned_up_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Live device actors in the registry
    pub active_count: usize,
    /// Devices materialized since process start
    pub devices_created_total: u64,
    /// Devices removed by deliberate eviction (idle cleanup or shutdown)
    pub devices_cleaned_up_total: u64,
    /// Highest active_count ever observed
    pub peak_count: usize,
}

/// A registered device: its handle plus the lever to hard-kill it
#[derive(Debug, Clone)]
struct DeviceEntry {
    handle: DeviceHandle,
    abort: AbortHandle,
}

/// Single-flight rendezvous for one port: the first caller materializes,
/// later arrivals await the same cell
struct DeviceSlot {
    cell: OnceCell<DeviceEntry>,
}

impl DeviceSlot {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

/// On-demand factory, registry, and reaper for device actors
pub struct LazyDevicePool {
    config: PoolConfig,
    profiles: Arc<dyn ProfileProvider>,
    assignments: RwLock<PortAssignments>,
    registry: DashMap<u16, Arc<DeviceSlot>>,
    active: AtomicUsize,
    created_total: AtomicU64,
    cleaned_total: AtomicU64,
    peak: AtomicUsize,
    clock_epoch: Instant,
    // Handed to exit monitors and the reaper so neither keeps the pool
    // alive past its owner
    me: Weak<LazyDevicePool>,
}

impl LazyDevicePool {
    /// Pool over the given configuration and profile source
    pub fn new(config: PoolConfig, profiles: Arc<dyn ProfileProvider>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            config,
            profiles,
            assignments: RwLock::new(PortAssignments::empty()),
            registry: DashMap::new(),
            active: AtomicUsize::new(0),
            created_total: AtomicU64::new(0),
            cleaned_total: AtomicU64::new(0),
            peak: AtomicUsize::new(0),
            clock_epoch: Instant::now(),
            me: me.clone(),
        })
    }

    /// Pool with default configuration and synthetic profiles
    pub fn with_defaults() -> Arc<Self> {
        Self::new(PoolConfig::default(), Arc::new(SyntheticProfiles))
    }

    /// The active configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Replace the active port assignments; existing devices are
    /// unaffected
    pub fn configure_port_assignments(&self, assignments: PortAssignments) {
        info!(
            ports = assignments.total_ports(),
            "port assignments configured"
        );
        *self.assignments.write() = assignments;
    }

    /// Return the device for `port`, materializing it on first query
    ///
    /// At most one actor exists per port under concurrent callers: the
    /// losing caller awaits the winner's creation and receives the same
    /// handle.
    pub async fn get_or_create_device(&self, port: u16) -> Result<DeviceHandle> {
        let device_type = self
            .assignments
            .read()
            .device_type_for(port)
            .ok_or(FleetError::UnknownPortRange { port })?;

        loop {
            let slot = self
                .registry
                .entry(port)
                .or_insert_with(|| Arc::new(DeviceSlot::new()))
                .clone();

            let entry = slot
                .cell
                .get_or_try_init(|| self.materialize(port, device_type))
                .await?
                .clone();

            if entry.handle.is_alive() {
                return Ok(entry.handle);
            }

            // The actor died before its monitor pruned the entry; prune
            // it here and retry with a fresh slot.
            self.detach(port, Some(entry.handle.device_id()), false);
        }
    }

    /// Spawn one device actor and register its exit monitor
    async fn materialize(&self, port: u16, device_type: DeviceType) -> Result<DeviceEntry> {
        // Reserve a slot under the cap before spawning anything
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.config.max_devices).then_some(n + 1)
            })
            .map_err(|_| FleetError::PoolExhausted {
                limit: self.config.max_devices,
            })?;

        let profile = self.profiles.profile_for(device_type, port);
        let (handle, task) = spawn_device(
            port,
            device_type,
            profile,
            self.clock_epoch,
            Duration::from_millis(defaults::TICK_INTERVAL_MS),
        );

        self.created_total.fetch_add(1, Ordering::Relaxed);
        self.peak
            .fetch_max(self.active.load(Ordering::SeqCst), Ordering::SeqCst);

        let abort = task.abort_handle();
        let device_id = handle.device_id();
        let pool = self.me.clone();
        tokio::spawn(async move {
            let outcome = task.await;
            let Some(pool) = pool.upgrade() else { return };
            // A deliberate eviction already detached the entry; anything
            // still registered here terminated on its own.
            if pool.detach(port, Some(device_id), false).is_some() {
                match outcome {
                    Err(join_err) if join_err.is_panic() => {
                        warn!(port, "device actor panicked, registry entry pruned");
                    }
                    _ => debug!(port, "device actor exited, registry entry pruned"),
                }
            }
        });

        debug!(port, %device_id, device_type = %device_type, "device materialized");
        Ok(DeviceEntry { handle, abort })
    }

    /// Remove a registered device from the registry
    ///
    /// The single decrement point for `active_count`. `expected` guards
    /// against evicting a newer incarnation on the same port; `deliberate`
    /// distinguishes evictions from crash pruning in the stats.
    fn detach(&self, port: u16, expected: Option<Uuid>, deliberate: bool) -> Option<DeviceEntry> {
        let (_, slot) = self.registry.remove_if(&port, |_, slot| {
            slot.cell.get().map_or(false, |entry| {
                expected.map_or(true, |id| entry.handle.device_id() == id)
            })
        })?;

        let entry = slot.cell.get().cloned()?;
        self.active.fetch_sub(1, Ordering::SeqCst);
        if deliberate {
            self.cleaned_total.fetch_add(1, Ordering::Relaxed);
        }
        Some(entry)
    }

    /// Ask the actor to stop, hard-killing it after the grace period
    fn evict(&self, entry: DeviceEntry) {
        entry.handle.request_shutdown();
        let abort = entry.abort;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(defaults::SHUTDOWN_GRACE_MS)).await;
            // No-op when the actor already stopped cooperatively
            abort.abort();
        });
    }

    /// Stop the device on `port`; a no-op when none is registered
    pub fn shutdown_device(&self, port: u16) {
        if let Some(entry) = self.detach(port, None, true) {
            debug!(port, "device shut down");
            self.evict(entry);
        }
    }

    /// Stop every registered device; lifetime counters are untouched
    pub fn shutdown_all_devices(&self) -> usize {
        let ports: Vec<u16> = self.registry.iter().map(|kv| *kv.key()).collect();
        let mut stopped = 0;
        for port in ports {
            if let Some(entry) = self.detach(port, None, true) {
                self.evict(entry);
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!(stopped, "all devices shut down");
        }
        stopped
    }

    /// Evict every device idle past the configured timeout
    ///
    /// Invoked periodically by the reaper and callable on demand.
    pub fn cleanup_idle_devices(&self) -> usize {
        let now_ns = self.clock_epoch.elapsed().as_nanos() as u64;
        let idle_ns = self.config.idle_timeout().as_nanos() as u64;

        let idle: Vec<(u16, Uuid)> = self
            .registry
            .iter()
            .filter_map(|kv| {
                let entry = kv.value().cell.get()?;
                let quiet_ns = now_ns.saturating_sub(entry.handle.last_activity_ns());
                (quiet_ns >= idle_ns).then(|| (*kv.key(), entry.handle.device_id()))
            })
            .collect();

        let mut evicted = 0;
        for (port, device_id) in idle {
            if let Some(entry) = self.detach(port, Some(device_id), true) {
                debug!(port, "idle device evicted");
                self.evict(entry);
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(evicted, "idle cleanup pass complete");
        }
        evicted
    }

    /// Snapshot of the pool counters
    pub fn get_stats(&self) -> PoolStats {
        PoolStats {
            active_count: self.active.load(Ordering::SeqCst),
            devices_created_total: self.created_total.load(Ordering::Relaxed),
            devices_cleaned_up_total: self.cleaned_total.load(Ordering::Relaxed),
            peak_count: self.peak.load(Ordering::SeqCst),
        }
    }

    /// Live devices per type, for telemetry snapshots
    pub fn active_count_by_type(&self) -> BTreeMap<DeviceType, usize> {
        let mut counts = BTreeMap::new();
        for kv in self.registry.iter() {
            if let Some(entry) = kv.value().cell.get() {
                if entry.handle.is_alive() {
                    *counts.entry(entry.handle.device_type()).or_default() += 1;
                }
            }
        }
        counts
    }

    /// Ports with a live registered device, in no particular order
    pub fn active_ports(&self) -> Vec<u16> {
        self.registry
            .iter()
            .filter(|kv| {
                kv.value()
                    .cell
                    .get()
                    .is_some_and(|entry| entry.handle.is_alive())
            })
            .map(|kv| *kv.key())
            .collect()
    }

    /// Start the periodic reaper; cancel the returned token to stop it
    ///
    /// The reaper holds only a weak reference, so dropping the pool also
    /// ends it.
    pub fn spawn_reaper(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let stop = token.clone();
        let pool = self.me.clone();
        let period = self.config.reaper_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh pool
            // is not swept at startup.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(pool) = pool.upgrade() else { break };
                        pool.cleanup_idle_devices();
                    }
                }
            }
            debug!("reaper stopped");
        });

        token
    }
}
