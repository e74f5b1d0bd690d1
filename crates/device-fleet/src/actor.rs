//! Per-port device actor
//!
//! One actor per device. The actor exclusively owns its `DeviceState`;
//! the only way in is the request mailbox, so requests are observed in
//! send order and no lock ever guards device state. Internal timers run
//! inside the actor's select! loop, so dropping a caller's future never
//! orphans work.

use crate::defaults;
use crate::error::{FleetError, Result};
use chrono::{Local, Timelike};
use device_core::{
    DeviceProfile, DeviceState, DeviceStatus, DeviceType, Oid, SnmpValue,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};
use uuid::Uuid;
use value_engine::ValueSimulator;

/// One queried object and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpVarBind {
    /// Queried object identifier
    pub oid: Oid,
    /// Current value, or `None` when the OID is not in the profile
    pub value: Option<SnmpValue>,
}

/// Value query against one device; the PDU envelope stays outside the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpQuery {
    /// Objects to read
    pub oids: Vec<Oid>,
}

impl SnmpQuery {
    /// Query over the given OIDs
    pub fn new(oids: impl IntoIterator<Item = Oid>) -> Self {
        Self {
            oids: oids.into_iter().collect(),
        }
    }
}

/// Answer to an [`SnmpQuery`], one varbind per queried OID, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpReply {
    /// Answers in query order
    pub varbinds: Vec<SnmpVarBind>,
}

/// Identity and health snapshot of one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable identity of this actor incarnation
    pub device_id: Uuid,
    /// UDP port the device answers on
    pub port: u16,
    /// Device taxonomy entry
    pub device_type: DeviceType,
    /// Seconds since the actor started
    pub uptime_seconds: u64,
    /// Operational status derived from health and error rate
    pub status: DeviceStatus,
    /// Interface load in [0, 1]
    pub interface_utilization: f64,
    /// CPU load in [0, 1]
    pub cpu_utilization: f64,
    /// Chassis temperature, Celsius
    pub temperature_celsius: f64,
    /// Overall health in [0, 1]
    pub health_score: f64,
}

/// Requests a device actor answers
#[derive(Debug)]
pub enum DeviceRequest {
    /// Identity and health snapshot
    GetInfo {
        /// Reply channel
        reply: oneshot::Sender<DeviceInfo>,
    },
    /// Evaluate a value query against the device profile
    HandleSnmp {
        /// The query
        query: SnmpQuery,
        /// Reply channel
        reply: oneshot::Sender<SnmpReply>,
    },
    /// Cooperative shutdown
    Shutdown,
}

/// Device actor owning all mutable device state
pub struct DeviceActor {
    state: DeviceState,
    profile: DeviceProfile,
    simulator: ValueSimulator<SmallRng>,
    rng: SmallRng,
    inbox: mpsc::Receiver<DeviceRequest>,
    started: Instant,
    clock_epoch: Instant,
    last_activity: Arc<AtomicU64>,
    tick_interval: Duration,
}

impl DeviceActor {
    /// Run the message loop until shutdown or mailbox closure
    pub async fn run(mut self) {
        debug!(
            port = self.state.port,
            device_type = %self.state.device_type,
            "device actor started"
        );

        let mut tick = interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                maybe_request = self.inbox.recv() => {
                    match maybe_request {
                        Some(DeviceRequest::GetInfo { reply }) => {
                            self.touch();
                            self.state.uptime_seconds = self.started.elapsed().as_secs();
                            let _ = reply.send(self.info());
                        }
                        Some(DeviceRequest::HandleSnmp { query, reply }) => {
                            self.touch();
                            let _ = reply.send(self.answer(query));
                        }
                        Some(DeviceRequest::Shutdown) | None => break,
                    }
                }
                _ = tick.tick() => {
                    self.advance_time();
                }
            }
        }

        debug!(port = self.state.port, "device actor stopped");
    }

    /// Stamp the activity clock; the reaper reads the shared atomic
    fn touch(&mut self) {
        let now_ns = self.clock_epoch.elapsed().as_nanos() as u64;
        self.last_activity.store(now_ns, Ordering::Release);
        self.state.last_activity_monotonic_ns = now_ns;
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: self.state.device_id,
            port: self.state.port,
            device_type: self.state.device_type,
            uptime_seconds: self.state.uptime_seconds,
            status: self.state.status(),
            interface_utilization: self.state.interface_utilization,
            cpu_utilization: self.state.cpu_utilization,
            temperature_celsius: self.state.temperature_celsius,
            health_score: self.state.health_score,
        }
    }

    fn answer(&mut self, query: SnmpQuery) -> SnmpReply {
        self.state.uptime_seconds = self.started.elapsed().as_secs();
        let now = Local::now();
        let hour_of_day = f64::from(now.hour()) + f64::from(now.minute()) / 60.0;

        let varbinds = query
            .oids
            .into_iter()
            .map(|oid| {
                let value = match self.profile.get(&oid) {
                    Some(entry) => {
                        let entry = entry.clone();
                        Some(self.simulator.simulate(
                            &oid,
                            &entry.datum,
                            entry.behavior.as_ref(),
                            &mut self.state,
                            hour_of_day,
                        ))
                    }
                    None => {
                        trace!(port = self.state.port, oid = %oid, "OID not in profile");
                        None
                    }
                };
                SnmpVarBind { oid, value }
            })
            .collect();

        SnmpReply { varbinds }
    }

    /// Advance uptime and random-walk the operational state
    fn advance_time(&mut self) {
        self.state.uptime_seconds = self.started.elapsed().as_secs();

        let state = &mut self.state;
        state.interface_utilization =
            walk(&mut self.rng, state.interface_utilization, 0.05, 0.02, 0.98);
        state.cpu_utilization = walk(&mut self.rng, state.cpu_utilization, 0.05, 0.02, 0.98);
        state.signal_quality = walk(&mut self.rng, state.signal_quality, 0.02, 0.3, 1.0);
        state.error_rate = walk(&mut self.rng, state.error_rate, 0.01, 0.0, 0.25);
        state.health_score = walk(&mut self.rng, state.health_score, 0.02, 0.2, 1.0);

        // Temperature relaxes toward the chassis baseline plus CPU load
        let target = state.device_type.characteristics().baseline_temperature_c
            + state.cpu_utilization * 15.0;
        state.temperature_celsius += (target - state.temperature_celsius) * 0.1
            + self.rng.gen_range(-0.3..=0.3);
    }
}

fn walk<R: Rng>(rng: &mut R, value: f64, step: f64, lo: f64, hi: f64) -> f64 {
    (value + rng.gen_range(-step..=step)).clamp(lo, hi)
}

/// Cheap-to-clone handle to one device actor
///
/// Requests are cancel-safe: dropping a caller's future leaves the actor
/// processing normally.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    port: u16,
    device_id: Uuid,
    device_type: DeviceType,
    sender: mpsc::Sender<DeviceRequest>,
    last_activity: Arc<AtomicU64>,
}

impl DeviceHandle {
    /// Port the device answers on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Identity of this actor incarnation
    pub fn device_id(&self) -> Uuid {
        self.device_id
    }

    /// Device taxonomy entry
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Whether the actor task is still consuming its mailbox
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Monotonic nanoseconds of the device's last observed activity
    pub fn last_activity_ns(&self) -> u64 {
        self.last_activity.load(Ordering::Acquire)
    }

    /// Identity and health snapshot
    pub async fn get_info(&self) -> Result<DeviceInfo> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DeviceRequest::GetInfo { reply: tx })
            .await
            .map_err(|_| FleetError::ActorCrashed { port: self.port })?;
        rx.await
            .map_err(|_| FleetError::ActorCrashed { port: self.port })
    }

    /// Evaluate a value query against the device profile
    pub async fn handle_snmp(&self, query: SnmpQuery) -> Result<SnmpReply> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DeviceRequest::HandleSnmp { query, reply: tx })
            .await
            .map_err(|_| FleetError::ActorCrashed { port: self.port })?;
        rx.await
            .map_err(|_| FleetError::ActorCrashed { port: self.port })
    }

    /// Ask the actor to stop; a no-op once it is already gone
    pub fn request_shutdown(&self) {
        let _ = self.sender.try_send(DeviceRequest::Shutdown);
    }
}

/// Spawn a device actor and return its handle and task
///
/// Operational state is seeded per device so a fleet does not move in
/// lockstep: each device gets its own utilization bias, signal quality,
/// and thermal offset.
pub(crate) fn spawn_device(
    port: u16,
    device_type: DeviceType,
    profile: DeviceProfile,
    clock_epoch: Instant,
    tick_interval: Duration,
) -> (DeviceHandle, JoinHandle<()>) {
    let device_id = Uuid::new_v4();
    let mut rng = SmallRng::from_entropy();

    let mut state = DeviceState::new(device_id, port, device_type);
    state.utilization_bias = rng.gen_range(0.75..=1.25);
    state.interface_utilization = rng.gen_range(0.2..=0.8);
    state.cpu_utilization = rng.gen_range(0.1..=0.6);
    state.signal_quality = rng.gen_range(0.8..=0.99);
    state.health_score = rng.gen_range(0.9..=1.0);
    state.error_rate = rng.gen_range(0.0..=0.05);
    state.temperature_celsius += rng.gen_range(-3.0..=3.0);

    let last_activity = Arc::new(AtomicU64::new(clock_epoch.elapsed().as_nanos() as u64));
    let (tx, rx) = mpsc::channel(defaults::ACTOR_MAILBOX);

    let actor = DeviceActor {
        state,
        profile,
        simulator: ValueSimulator::new(SmallRng::from_entropy()),
        rng,
        inbox: rx,
        started: Instant::now(),
        clock_epoch,
        last_activity: Arc::clone(&last_activity),
        tick_interval,
    };

    let handle = DeviceHandle {
        port,
        device_id,
        device_type,
        sender: tx,
        last_activity,
    };

    (handle, tokio::spawn(actor.run()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ProfileProvider, SyntheticProfiles};

    fn spawn_test_device(port: u16, device_type: DeviceType) -> (DeviceHandle, JoinHandle<()>) {
        let profile = SyntheticProfiles.profile_for(device_type, port);
        spawn_device(
            port,
            device_type,
            profile,
            Instant::now(),
            Duration::from_millis(defaults::TICK_INTERVAL_MS),
        )
    }

    #[tokio::test]
    async fn test_get_info() {
        let (handle, task) = spawn_test_device(30_050, DeviceType::CableModem);

        let info = handle.get_info().await.unwrap();
        assert_eq!(info.port, 30_050);
        assert_eq!(info.device_type, DeviceType::CableModem);
        assert_eq!(info.device_id, handle.device_id());
        assert!((0.0..=1.0).contains(&info.health_score));

        handle.request_shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_snmp_query_answers_known_and_unknown_oids() {
        let (handle, task) = spawn_test_device(30_051, DeviceType::CableModem);

        let query = SnmpQuery::new([
            Oid::from("1.3.6.1.2.1.1.1.0"),
            Oid::from("1.3.6.1.2.1.2.2.1.10.1"),
            Oid::from("1.3.6.1.9.9.9.0"),
        ]);
        let reply = handle.handle_snmp(query).await.unwrap();

        assert_eq!(reply.varbinds.len(), 3);
        assert_eq!(
            reply.varbinds[0].value.as_ref().and_then(|v| v.as_text()),
            Some("DOCSIS 3.1 cable modem")
        );
        assert!(matches!(
            reply.varbinds[1].value,
            Some(SnmpValue::Counter32(_))
        ));
        assert!(reply.varbinds[2].value.is_none());

        handle.request_shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_traffic_counter_monotone_across_queries() {
        let (handle, task) = spawn_test_device(30_052, DeviceType::Switch);
        let oid = Oid::from("1.3.6.1.2.1.2.2.1.10.1");

        let mut previous = 0u32;
        for _ in 0..5 {
            let reply = handle
                .handle_snmp(SnmpQuery::new([oid.clone()]))
                .await
                .unwrap();
            let value = reply.varbinds[0]
                .value
                .as_ref()
                .and_then(SnmpValue::as_counter32)
                .unwrap();
            assert!(value >= previous);
            previous = value;
        }

        handle.request_shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_activity_stamp_advances_on_requests() {
        let (handle, task) = spawn_test_device(30_053, DeviceType::Router);

        let before = handle.last_activity_ns();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.get_info().await.unwrap();
        let after = handle.last_activity_ns();
        assert!(after > before, "activity stamp did not advance");

        handle.request_shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_mailbox() {
        let (handle, task) = spawn_test_device(30_054, DeviceType::Server);
        assert!(handle.is_alive());

        handle.request_shutdown();
        task.await.unwrap();
        assert!(!handle.is_alive());
        assert!(matches!(
            handle.get_info().await,
            Err(FleetError::ActorCrashed { port: 30_054 })
        ));
    }

    #[tokio::test]
    async fn test_cancel_safety() {
        let (handle, task) = spawn_test_device(30_055, DeviceType::CableModem);

        // Start a request but drop it before the reply arrives
        let pending = handle.get_info();
        drop(pending);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let info = handle.get_info().await.unwrap();
        assert_eq!(info.port, 30_055);

        handle.request_shutdown();
        task.await.unwrap();
    }
}
