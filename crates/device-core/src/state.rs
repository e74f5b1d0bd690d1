//! Mutable per-device state
//!
//! Owned exclusively by one device actor. The value engine reads the
//! operational fields and advances the per-OID counter accumulators;
//! nothing else mutates it.

use crate::device::DeviceType;
use crate::profile::Oid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Operational status derived from health score and error rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Healthy and forwarding
    Up,
    /// Impaired but reachable
    Degraded,
    /// Effectively offline
    Down,
}

impl DeviceStatus {
    /// Canonical external representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Up => "up",
            DeviceStatus::Degraded => "degraded",
            DeviceStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cumulative growth record for one counter OID
///
/// Counter32 outputs are derived from the 64-bit total so wraps stay
/// monotone against true cumulative growth rather than being re-derived
/// from uptime each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterAccumulator {
    /// Total accumulated units (bytes or events) since device start
    pub total_units: u64,
    /// Device uptime at the previous sample, seconds
    pub last_uptime_seconds: u64,
}

/// Mutable state of one simulated device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    /// Stable identity of this actor incarnation
    pub device_id: Uuid,
    /// UDP port the device answers on
    pub port: u16,
    /// Device taxonomy entry
    pub device_type: DeviceType,
    /// Seconds since the actor started
    pub uptime_seconds: u64,
    /// Interface load in [0, 1]
    pub interface_utilization: f64,
    /// CPU load in [0, 1]
    pub cpu_utilization: f64,
    /// RF signal quality in [0, 1]; 1 is pristine
    pub signal_quality: f64,
    /// Chassis temperature, Celsius
    pub temperature_celsius: f64,
    /// Overall health in [0, 1]
    pub health_score: f64,
    /// Error propensity in [0, 1]
    pub error_rate: f64,
    /// Per-device multiplier applied to utilization gauges
    pub utilization_bias: f64,
    /// Monotonic nanoseconds of the last externally-observable operation
    pub last_activity_monotonic_ns: u64,
    /// Per-OID cumulative counter growth
    pub counter_accumulators: HashMap<Oid, CounterAccumulator>,
}

impl DeviceState {
    /// Fresh state with neutral operational values
    pub fn new(device_id: Uuid, port: u16, device_type: DeviceType) -> Self {
        Self {
            device_id,
            port,
            device_type,
            uptime_seconds: 0,
            interface_utilization: 0.5,
            cpu_utilization: 0.3,
            signal_quality: 0.9,
            temperature_celsius: device_type.characteristics().baseline_temperature_c,
            health_score: 0.95,
            error_rate: 0.02,
            utilization_bias: 1.0,
            last_activity_monotonic_ns: 0,
            counter_accumulators: HashMap::new(),
        }
    }

    /// Accumulator for one counter OID, created on first touch
    pub fn counter_entry(&mut self, oid: &Oid) -> &mut CounterAccumulator {
        self.counter_accumulators.entry(oid.clone()).or_default()
    }

    /// Status derived from health score and error rate: health minus
    /// twice the error rate, cut at 0.7 and 0.4
    pub fn status(&self) -> DeviceStatus {
        let score = self.health_score - 2.0 * self.error_rate;
        if score > 0.7 {
            DeviceStatus::Up
        } else if score > 0.4 {
            DeviceStatus::Degraded
        } else {
            DeviceStatus::Down
        }
    }
}
