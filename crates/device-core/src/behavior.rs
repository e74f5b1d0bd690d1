//! Per-OID value behavior descriptors
//!
//! A behavior describes how an object's value evolves over device time.
//! The set is closed and small, so it is a sum type with dedicated
//! parameter records rather than a dynamic map. Objects with no behavior
//! attached are answered from their static profile value.

use serde::{Deserialize, Serialize};

/// Variation pattern applied to a utilization gauge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugePattern {
    /// No deterministic variation; noise only
    Flat,
    /// Sinusoid peaking inside the configured peak-hours window
    #[default]
    DailyVariation,
}

/// How an OID's value evolves over time
///
/// Counter rate ranges are in bits per second for traffic and events per
/// second for errors. Gauge ranges are inclusive and outputs are clamped
/// into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "snake_case")]
pub enum BehaviorDescriptor {
    /// Monotonically growing octet counter with diurnal and burst
    /// modulation; increments are byte-denominated
    TrafficCounter {
        /// Instantaneous bit-rate bounds, bits per second
        rate_range: (u64, u64),
        /// Apply the time-of-day factor (peak mid-afternoon)
        time_of_day_variation: bool,
        /// Probability a sample lands inside a traffic burst
        burst_probability: f64,
    },

    /// Bounded gauge centered in its range with pattern-driven variation
    UtilizationGauge {
        /// Inclusive output bounds
        range: (i32, i32),
        /// Deterministic variation pattern
        pattern: GaugePattern,
        /// Busy window as (start_hour, end_hour), 24h clock
        peak_hours: (u8, u8),
    },

    /// Signal-to-noise gauge; tracks utilization inversely
    SnrGauge {
        /// Inclusive output bounds
        range: (i32, i32),
        /// Fraction of the range lost at full utilization
        degradation_factor: f64,
    },

    /// RF power gauge offset by signal quality
    PowerGauge {
        /// Inclusive output bounds
        range: (i32, i32),
        /// Pull the level down as temperature rises past 25 C
        weather_correlation: bool,
    },

    /// Error counter correlated with load; increments are
    /// event-denominated
    ErrorCounter {
        /// Base error-rate bounds, events per second
        rate_range: (u64, u64),
        /// Probability a sample lands inside an error burst
        error_burst_probability: f64,
        /// Scale the base rate with poor signal and high utilization
        correlation_with_utilization: bool,
    },

    /// Monotonic uptime ticks with rare agent-restart resets
    UptimeCounter {
        /// Ticks emitted per second of uptime (100 for TimeTicks)
        increment_rate: f64,
        /// Per-sample probability of reporting an agent restart
        reset_probability: f64,
    },

    /// Health-driven operational status string
    StatusEnum,

    /// Temperature gauge optionally coupled to CPU load
    TemperatureGauge {
        /// Inclusive output bounds, Celsius
        range: (i32, i32),
        /// Add up to 30 C under full CPU load
        load_correlation: bool,
    },

    /// Always answer the static profile value
    StaticValue,
}

impl BehaviorDescriptor {
    /// Short tag, useful in logs
    pub fn kind(&self) -> &'static str {
        match self {
            BehaviorDescriptor::TrafficCounter { .. } => "traffic_counter",
            BehaviorDescriptor::UtilizationGauge { .. } => "utilization_gauge",
            BehaviorDescriptor::SnrGauge { .. } => "snr_gauge",
            BehaviorDescriptor::PowerGauge { .. } => "power_gauge",
            BehaviorDescriptor::ErrorCounter { .. } => "error_counter",
            BehaviorDescriptor::UptimeCounter { .. } => "uptime_counter",
            BehaviorDescriptor::StatusEnum => "status_enum",
            BehaviorDescriptor::TemperatureGauge { .. } => "temperature_gauge",
            BehaviorDescriptor::StaticValue => "static_value",
        }
    }
}
