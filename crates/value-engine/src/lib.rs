//! Value simulation engine
//!
//! Turns a static profile value, a behavior descriptor, and the current
//! device state into a typed SNMP value with realistic temporal dynamics:
//! counters that grow with diurnal and burst modulation, gauges bounded to
//! their ranges, error counters correlated with load, monotonic uptime,
//! and health-driven status strings.
//!
//! The engine is pure apart from its injected RNG and never fails; an
//! absent or unrecognized behavior falls back to the static profile value.

pub mod simulator;

pub use simulator::{time_of_day_factor, ValueSimulator};
