//! Bulk population startup
//!
//! Partitions a port range across device types in the order their specs
//! were given, configures the pool, fans creation across a bounded worker
//! pool, and aggregates the outcome. A startup succeeds when at least 80%
//! of the requested population comes up.

use crate::config::StartupOptions;
use crate::defaults;
use crate::error::{FleetError, Result};
use crate::pool::LazyDevicePool;
use chrono::{DateTime, Utc};
use device_core::{DeviceMix, DeviceType, DistributionError, PortAssignments, PortSlice};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One device that failed to come up during bulk startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupFailure {
    /// Port the creation targeted
    pub port: u16,
    /// Type the port was assigned
    pub device_type: DeviceType,
    /// Failure description
    pub error: String,
}

/// Aggregated outcome of one bulk startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupResult {
    /// Devices that came up
    pub total_devices: usize,
    /// Successes per device type
    pub per_type_created: BTreeMap<DeviceType, usize>,
    /// Per-device failures; empty on a clean startup
    pub failures: Vec<StartupFailure>,
}

/// Current startup book-keeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupStatus {
    /// Live devices in the pool right now
    pub active_devices: usize,
    /// When the last population was started, if one is up
    pub started_at: Option<DateTime<Utc>>,
    /// Most recent orchestration error, if any
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Bookkeeping {
    started_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Orchestrates whole-population startup and teardown over a pool
pub struct FleetStartup {
    pool: Arc<LazyDevicePool>,
    cancel: CancellationToken,
    book: Mutex<Bookkeeping>,
}

impl FleetStartup {
    /// Orchestrator over the given pool
    pub fn new(pool: Arc<LazyDevicePool>) -> Self {
        Self {
            pool,
            cancel: CancellationToken::new(),
            book: Mutex::new(Bookkeeping::default()),
        }
    }

    /// The pool this orchestrator drives
    pub fn pool(&self) -> &Arc<LazyDevicePool> {
        &self.pool
    }

    /// Parent cancellation signal honored by startup workers
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bring up a population of `(device_type, count)` specs
    ///
    /// The port range is partitioned across types in the order the specs
    /// list them. Workers
    /// honor the parent cancellation signal; an in-flight creation
    /// completes but may be evicted immediately afterward.
    pub async fn start_device_population(
        &self,
        specs: &[(DeviceType, usize)],
        opts: &StartupOptions,
    ) -> Result<StartupResult> {
        let requested: usize = specs.iter().map(|(_, count)| count).sum();
        let assignments = partition_in_spec_order(specs, opts.port_range)?;
        self.pool.configure_port_assignments(assignments.clone());
        self.book.lock().started_at = Some(Utc::now());

        info!(
            requested,
            workers = opts.parallel_workers,
            "starting device population"
        );

        // Deal ports round-robin into bounded worker batches
        let workers = opts.parallel_workers.max(1);
        let mut batches: Vec<Vec<(u16, DeviceType)>> = vec![Vec::new(); workers];
        for (index, item) in assignments.iter_ports().enumerate() {
            batches[index % workers].push(item);
        }

        let mut tasks = JoinSet::new();
        for batch in batches.into_iter().filter(|batch| !batch.is_empty()) {
            let pool = Arc::clone(&self.pool);
            let cancel = self.cancel.clone();
            let per_task_timeout = opts.per_task_timeout();
            tasks.spawn(async move {
                let mut created: Vec<DeviceType> = Vec::new();
                let mut failures: Vec<StartupFailure> = Vec::new();
                for (port, device_type) in batch {
                    if cancel.is_cancelled() {
                        break;
                    }
                    match tokio::time::timeout(per_task_timeout, pool.get_or_create_device(port))
                        .await
                    {
                        Ok(Ok(_handle)) => created.push(device_type),
                        Ok(Err(err)) => failures.push(StartupFailure {
                            port,
                            device_type,
                            error: err.to_string(),
                        }),
                        Err(_) => failures.push(StartupFailure {
                            port,
                            device_type,
                            error: format!("creation timed out after {per_task_timeout:?}"),
                        }),
                    }
                }
                (created, failures)
            });
        }

        let mut per_type_created: BTreeMap<DeviceType, usize> = BTreeMap::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((created, worker_failures)) => {
                    for device_type in created {
                        *per_type_created.entry(device_type).or_default() += 1;
                    }
                    failures.extend(worker_failures);
                }
                Err(join_err) => {
                    warn!(error = %join_err, "startup worker aborted");
                }
            }
        }

        let total_devices: usize = per_type_created.values().sum();
        let threshold =
            (requested as f64 * defaults::STARTUP_SUCCESS_RATIO).ceil() as usize;

        if total_devices >= threshold {
            info!(
                total_devices,
                requested,
                failed = failures.len(),
                "device population started"
            );
            Ok(StartupResult {
                total_devices,
                per_type_created,
                failures,
            })
        } else {
            let err = FleetError::PopulationIncomplete {
                created: total_devices,
                requested,
            };
            warn!(total_devices, requested, "device population incomplete");
            self.book.lock().last_error = Some(err.to_string());
            Err(err)
        }
    }

    /// Bring up a named preset mix
    pub async fn start_device_mix(
        &self,
        name: &str,
        opts: &StartupOptions,
    ) -> Result<StartupResult> {
        let mix = DeviceMix::preset(name).ok_or_else(|| FleetError::UnknownMix {
            name: name.to_string(),
        })?;
        self.start_device_population(&mix.to_specs(), opts).await
    }

    /// Tear the population down and reset startup book-keeping
    ///
    /// Lifetime pool counters are untouched.
    pub fn shutdown_device_population(&self) -> usize {
        let stopped = self.pool.shutdown_all_devices();
        let mut book = self.book.lock();
        book.started_at = None;
        book.last_error = None;
        stopped
    }

    /// Snapshot of the orchestrator's view of the fleet
    pub fn get_startup_status(&self) -> StartupStatus {
        let book = self.book.lock();
        StartupStatus {
            active_devices: self.pool.get_stats().active_count,
            started_at: book.started_at,
            last_error: book.last_error.clone(),
        }
    }
}

/// Carve the range into consecutive slices following spec order, not the
/// canonical type ordering
fn partition_in_spec_order(
    specs: &[(DeviceType, usize)],
    port_range: (u16, u16),
) -> Result<PortAssignments> {
    let (range_start, range_end) = port_range;
    let available = if range_end >= range_start {
        (range_end as usize) - (range_start as usize) + 1
    } else {
        0
    };
    let required: usize = specs.iter().map(|(_, count)| count).sum();
    if required > available {
        return Err(DistributionError::InsufficientPorts {
            required,
            available,
        }
        .into());
    }

    let mut slices = Vec::new();
    let mut cursor = range_start as u32;
    for &(device_type, count) in specs {
        if count == 0 {
            continue;
        }
        slices.push(PortSlice {
            device_type,
            start: cursor as u16,
            end: (cursor + count as u32 - 1) as u16,
        });
        cursor += count as u32;
    }
    Ok(PortAssignments::from_slices(slices, port_range)?)
}
