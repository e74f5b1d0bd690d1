//! Per-OID value simulation
//!
//! One entry point, [`ValueSimulator::simulate`], dispatches over the
//! behavior descriptor arms. Counter behaviors advance the per-OID 64-bit
//! accumulators held in `DeviceState`; everything else derives from the
//! operational fields and the injected RNG.

use device_core::{
    BehaviorDescriptor, DeviceState, GaugePattern, Oid, ProfileDatum, SnmpValue,
};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;
use tracing::trace;

const COUNTER_MODULUS: u64 = 1 << 32;

/// Diurnal traffic modulation: bell-shaped with the peak mid-afternoon
/// around 14:00 and the trough in the early morning, total swing 0.6
pub fn time_of_day_factor(hour_of_day: f64) -> f64 {
    1.0 + 0.3 * ((hour_of_day - 14.0) / 24.0 * TAU).cos()
}

/// Stochastic value generator with an injected RNG
///
/// Pure in the sense of no hidden global state: all randomness flows
/// through the RNG handed in at construction, so property tests can pin
/// the seed and the hour of day.
pub struct ValueSimulator<R: Rng> {
    rng: R,
}

impl<R: Rng + SeedableRng> ValueSimulator<R> {
    /// Simulator over a seeded RNG, for deterministic tests
    pub fn seeded(seed: u64) -> Self {
        Self { rng: R::seed_from_u64(seed) }
    }

    /// Simulator over an entropy-seeded RNG
    pub fn from_entropy() -> Self {
        Self { rng: R::from_entropy() }
    }
}

impl<R: Rng> ValueSimulator<R> {
    /// Simulator over the given RNG
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Produce the current value for one OID
    ///
    /// Never fails: an absent behavior answers the static profile value,
    /// typed according to its declared syntax.
    pub fn simulate(
        &mut self,
        oid: &Oid,
        datum: &ProfileDatum,
        behavior: Option<&BehaviorDescriptor>,
        state: &mut DeviceState,
        hour_of_day: f64,
    ) -> SnmpValue {
        match behavior {
            Some(BehaviorDescriptor::TrafficCounter {
                rate_range,
                time_of_day_variation,
                burst_probability,
            }) => self.traffic_counter(
                oid,
                datum,
                *rate_range,
                *time_of_day_variation,
                *burst_probability,
                state,
                hour_of_day,
            ),
            Some(BehaviorDescriptor::UtilizationGauge {
                range,
                pattern,
                peak_hours,
            }) => self.utilization_gauge(*range, *pattern, *peak_hours, state, hour_of_day),
            Some(BehaviorDescriptor::SnrGauge {
                range,
                degradation_factor,
            }) => self.snr_gauge(*range, *degradation_factor, state),
            Some(BehaviorDescriptor::PowerGauge {
                range,
                weather_correlation,
            }) => self.power_gauge(*range, *weather_correlation, state),
            Some(BehaviorDescriptor::ErrorCounter {
                rate_range,
                error_burst_probability,
                correlation_with_utilization,
            }) => self.error_counter(
                oid,
                datum,
                *rate_range,
                *error_burst_probability,
                *correlation_with_utilization,
                state,
            ),
            Some(BehaviorDescriptor::UptimeCounter {
                increment_rate,
                reset_probability,
            }) => self.uptime_counter(*increment_rate, *reset_probability, state),
            Some(BehaviorDescriptor::StatusEnum) => {
                SnmpValue::OctetString(state.status().as_str().as_bytes().to_vec())
            }
            Some(BehaviorDescriptor::TemperatureGauge {
                range,
                load_correlation,
            }) => self.temperature_gauge(datum, *range, *load_correlation, state),
            Some(BehaviorDescriptor::StaticValue) => datum.to_value(),
            None => {
                trace!(oid = %oid, "no behavior attached, answering static value");
                datum.to_value()
            }
        }
    }

    /// Octet counter growing at a sampled bit-rate shaped by the diurnal
    /// factor, interface utilization, and occasional bursts
    fn traffic_counter(
        &mut self,
        oid: &Oid,
        datum: &ProfileDatum,
        rate_range: (u64, u64),
        time_of_day_variation: bool,
        burst_probability: f64,
        state: &mut DeviceState,
        hour_of_day: f64,
    ) -> SnmpValue {
        let (lo, hi) = ordered(rate_range);
        let mut rate_bps = self.rng.gen_range(lo..=hi) as f64;
        if time_of_day_variation {
            rate_bps *= time_of_day_factor(hour_of_day);
        }
        rate_bps *= state.interface_utilization.clamp(0.0, 1.0);
        if self.rng.gen_bool(burst_probability.clamp(0.0, 1.0)) {
            rate_bps *= self.rng.gen_range(2.0..=5.0);
        }

        let uptime = state.uptime_seconds;
        let acc = state.counter_entry(oid);
        let elapsed = uptime.saturating_sub(acc.last_uptime_seconds);
        let increment = (rate_bps * elapsed as f64 / 8.0) as u64;
        acc.total_units = acc.total_units.saturating_add(increment);
        acc.last_uptime_seconds = uptime;

        wrap_counter(datum.value.as_u64(), acc.total_units)
    }

    /// Error counter whose rate scales with poor signal and high load
    fn error_counter(
        &mut self,
        oid: &Oid,
        datum: &ProfileDatum,
        rate_range: (u64, u64),
        error_burst_probability: f64,
        correlation_with_utilization: bool,
        state: &mut DeviceState,
    ) -> SnmpValue {
        let (lo, hi) = ordered(rate_range);
        let mut rate_eps = self.rng.gen_range(lo..=hi) as f64;
        if correlation_with_utilization {
            let scale = (1.0 - state.signal_quality.clamp(0.0, 1.0))
                + state.interface_utilization.clamp(0.0, 1.0);
            rate_eps *= scale;
        }
        if self.rng.gen_bool(error_burst_probability.clamp(0.0, 1.0)) {
            rate_eps *= self.rng.gen_range(10.0..=50.0);
        }

        let uptime = state.uptime_seconds;
        let acc = state.counter_entry(oid);
        let elapsed = uptime.saturating_sub(acc.last_uptime_seconds);
        let increment = (rate_eps * elapsed as f64) as u64;
        acc.total_units = acc.total_units.saturating_add(increment);
        acc.last_uptime_seconds = uptime;

        wrap_counter(datum.value.as_u64(), acc.total_units)
    }

    /// Gauge centered in its range with optional daily sinusoid, scaled by
    /// the device's utilization bias
    fn utilization_gauge(
        &mut self,
        range: (i32, i32),
        pattern: GaugePattern,
        peak_hours: (u8, u8),
        state: &mut DeviceState,
        hour_of_day: f64,
    ) -> SnmpValue {
        let (lo, hi) = ordered(range);
        let span = (hi - lo) as f64;
        let mut value = lo as f64 + span / 2.0;
        if pattern == GaugePattern::DailyVariation {
            value += peak_window_factor(hour_of_day, peak_hours) * span * 0.25;
        }
        value *= state.utilization_bias;
        value += self.gauss(span * 0.03);
        clamp_gauge(value, lo, hi)
    }

    /// SNR starts at mid-range and degrades as utilization climbs
    fn snr_gauge(
        &mut self,
        range: (i32, i32),
        degradation_factor: f64,
        state: &mut DeviceState,
    ) -> SnmpValue {
        let (lo, hi) = ordered(range);
        let span = (hi - lo) as f64;
        let mid = lo as f64 + span / 2.0;
        let utilization = state.interface_utilization.clamp(0.0, 1.0);
        let value = mid - degradation_factor * utilization * span + self.gauss(span * 0.02);
        clamp_gauge(value, lo, hi)
    }

    /// RF power centered at zero when the range straddles it, offset by
    /// signal quality and pulled down in hot weather
    fn power_gauge(
        &mut self,
        range: (i32, i32),
        weather_correlation: bool,
        state: &mut DeviceState,
    ) -> SnmpValue {
        let (lo, hi) = ordered(range);
        let span = (hi - lo) as f64;
        let center = if lo < 0 && hi > 0 {
            0.0
        } else {
            lo as f64 + span / 2.0
        };
        let mut value = center + (state.signal_quality.clamp(0.0, 1.0) - 0.5) * span;
        if weather_correlation {
            value -= (state.temperature_celsius - 25.0).max(0.0) * 0.05 * span;
        }
        value += self.gauss(span * 0.02);
        clamp_gauge(value, lo, hi)
    }

    /// TimeTicks derived from uptime; a rare reset draw reports an agent
    /// restart for one sample without starting a new epoch
    fn uptime_counter(
        &mut self,
        increment_rate: f64,
        reset_probability: f64,
        state: &DeviceState,
    ) -> SnmpValue {
        if self.rng.gen_bool(reset_probability.clamp(0.0, 1.0)) {
            return SnmpValue::TimeTicks(0);
        }
        let ticks = (state.uptime_seconds as f64 * increment_rate.max(0.0)) as u64;
        SnmpValue::TimeTicks((ticks % COUNTER_MODULUS) as u32)
    }

    /// Temperature around the profile base, coupled to CPU load
    fn temperature_gauge(
        &mut self,
        datum: &ProfileDatum,
        range: (i32, i32),
        load_correlation: bool,
        state: &mut DeviceState,
    ) -> SnmpValue {
        let (lo, hi) = ordered(range);
        let mut value = datum.value.as_i64().unwrap_or(0) as f64;
        if load_correlation {
            value += state.cpu_utilization.clamp(0.0, 1.0) * 30.0;
        }
        value += self.gauss(1.5);
        clamp_gauge(value, lo, hi)
    }

    /// Gaussian sample with the given standard deviation, zero when the
    /// deviation is degenerate
    fn gauss(&mut self, sigma: f64) -> f64 {
        match Normal::new(0.0, sigma) {
            Ok(normal) if sigma > 0.0 => normal.sample(&mut self.rng),
            _ => 0.0,
        }
    }
}

/// Counter32 output: base plus 64-bit cumulative growth, wrapped mod 2^32
fn wrap_counter(base: u64, total_units: u64) -> SnmpValue {
    let wrapped = (base as u128 + total_units as u128) % COUNTER_MODULUS as u128;
    SnmpValue::Counter32(wrapped as u32)
}

/// Round and clamp a gauge into its inclusive range
fn clamp_gauge(value: f64, lo: i32, hi: i32) -> SnmpValue {
    let rounded = value.round();
    let clamped = rounded.clamp(lo as f64, hi as f64);
    SnmpValue::Gauge32(clamped as i32)
}

/// Sinusoid peaking at the middle of the busy window, in [-1, 1]
fn peak_window_factor(hour_of_day: f64, peak_hours: (u8, u8)) -> f64 {
    let (start, end) = peak_hours;
    let width = (f64::from(end) - f64::from(start)).rem_euclid(24.0);
    let mid = (f64::from(start) + width / 2.0).rem_euclid(24.0);
    ((hour_of_day - mid) / 24.0 * TAU).cos()
}

fn ordered<T: PartialOrd>(range: (T, T)) -> (T, T) {
    if range.0 <= range.1 {
        range
    } else {
        (range.1, range.0)
    }
}
