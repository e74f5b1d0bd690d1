//! Profile provisioning for new device actors
//!
//! Loading MIB profiles from disk is an external collaborator's job; the
//! pool only needs something that can hand a new actor its OID table.
//! [`SyntheticProfiles`] is the built-in provider so a fleet is usable
//! with no profile files at all.

use device_core::{
    BehaviorDescriptor, DeviceProfile, DeviceType, GaugePattern, ProfileDatum,
};

/// Source of per-device OID tables, consulted once per actor creation
pub trait ProfileProvider: Send + Sync {
    /// Profile for the device materializing on `port`
    fn profile_for(&self, device_type: DeviceType, port: u16) -> DeviceProfile;
}

/// Built-in generator of realistic per-type OID tables
///
/// Emits the system group, a sampled interface table with traffic and
/// error counters, CPU and temperature gauges, and RF signal gauges for
/// signal-monitoring device types.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProfiles;

impl SyntheticProfiles {
    /// Interface entries emitted per device; real interface counts on a
    /// CMTS or switch would bloat every profile without adding simulation
    /// value
    const SAMPLED_INTERFACES: u16 = 4;

    fn traffic_rate_range(device_type: DeviceType) -> (u64, u64) {
        match device_type {
            DeviceType::CableModem => (10_000, 100_000_000),
            DeviceType::Mta => (1_000, 1_000_000),
            DeviceType::Cmts => (1_000_000, 10_000_000_000),
            DeviceType::Switch => (100_000, 1_000_000_000),
            DeviceType::Router => (100_000, 2_000_000_000),
            DeviceType::Server => (50_000, 500_000_000),
        }
    }
}

impl ProfileProvider for SyntheticProfiles {
    fn profile_for(&self, device_type: DeviceType, port: u16) -> DeviceProfile {
        let chars = device_type.characteristics();
        let mut profile = DeviceProfile::new();

        // System group
        profile.insert(
            "1.3.6.1.2.1.1.1.0",
            ProfileDatum::string(chars.description),
            None,
        );
        profile.insert(
            "1.3.6.1.2.1.1.3.0",
            ProfileDatum::timeticks(0),
            Some(BehaviorDescriptor::UptimeCounter {
                increment_rate: 100.0,
                reset_probability: 0.000_1,
            }),
        );
        profile.insert(
            "1.3.6.1.2.1.1.5.0",
            ProfileDatum::string(format!("{device_type}-{port}")),
            None,
        );

        // Sampled interface table
        let rate_range = Self::traffic_rate_range(device_type);
        let interfaces = chars.typical_interfaces.min(Self::SAMPLED_INTERFACES);
        for ifindex in 1..=interfaces {
            profile.insert(
                format!("1.3.6.1.2.1.2.2.1.10.{ifindex}"),
                ProfileDatum::counter32(0),
                Some(BehaviorDescriptor::TrafficCounter {
                    rate_range,
                    time_of_day_variation: true,
                    burst_probability: 0.1,
                }),
            );
            profile.insert(
                format!("1.3.6.1.2.1.2.2.1.16.{ifindex}"),
                ProfileDatum::counter32(0),
                Some(BehaviorDescriptor::TrafficCounter {
                    rate_range,
                    time_of_day_variation: true,
                    burst_probability: 0.05,
                }),
            );
            profile.insert(
                format!("1.3.6.1.2.1.2.2.1.8.{ifindex}"),
                ProfileDatum::string("up"),
                Some(BehaviorDescriptor::StatusEnum),
            );
            profile.insert(
                format!("1.3.6.1.2.1.2.2.1.14.{ifindex}"),
                ProfileDatum::counter32(0),
                Some(BehaviorDescriptor::ErrorCounter {
                    rate_range: (0, 5),
                    error_burst_probability: 0.02,
                    correlation_with_utilization: true,
                }),
            );
        }

        // Host gauges
        profile.insert(
            "1.3.6.1.4.1.9.2.1.58.0",
            ProfileDatum::gauge32(30),
            Some(BehaviorDescriptor::UtilizationGauge {
                range: (0, 100),
                pattern: GaugePattern::DailyVariation,
                peak_hours: (9, 17),
            }),
        );
        profile.insert(
            "1.3.6.1.4.1.2021.13.16.2.1.3.1",
            ProfileDatum::gauge32(chars.baseline_temperature_c as i32),
            Some(BehaviorDescriptor::TemperatureGauge {
                range: (20, 85),
                load_correlation: true,
            }),
        );

        // RF signal gauges, tenths of dB / dBmV
        if chars.signal_monitoring {
            profile.insert(
                "1.3.6.1.2.1.10.127.1.1.4.1.5.3",
                ProfileDatum::gauge32(350),
                Some(BehaviorDescriptor::SnrGauge {
                    range: (250, 400),
                    degradation_factor: 0.2,
                }),
            );
            profile.insert(
                "1.3.6.1.2.1.10.127.1.1.1.1.6.3",
                ProfileDatum::gauge32(0),
                Some(BehaviorDescriptor::PowerGauge {
                    range: (-150, 150),
                    weather_correlation: true,
                }),
            );
        }

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_core::Oid;

    #[test]
    fn test_every_type_yields_a_profile() {
        let provider = SyntheticProfiles;
        for device_type in DeviceType::ALL {
            let profile = provider.profile_for(device_type, 30_000);
            assert!(!profile.is_empty(), "{device_type} profile is empty");
            assert!(profile.get(&Oid::from("1.3.6.1.2.1.1.3.0")).is_some());
        }
    }

    #[test]
    fn test_signal_gauges_follow_monitoring_flag() {
        let provider = SyntheticProfiles;
        let snr = Oid::from("1.3.6.1.2.1.10.127.1.1.4.1.5.3");

        let modem = provider.profile_for(DeviceType::CableModem, 30_000);
        assert!(modem.get(&snr).is_some());

        let switch = provider.profile_for(DeviceType::Switch, 31_000);
        assert!(switch.get(&snr).is_none());
    }

    #[test]
    fn test_interface_table_is_sampled() {
        let provider = SyntheticProfiles;
        let cmts = provider.profile_for(DeviceType::Cmts, 32_000);
        // 64 physical interfaces collapse to the sampled table
        assert!(cmts.get(&Oid::from("1.3.6.1.2.1.2.2.1.10.4")).is_some());
        assert!(cmts.get(&Oid::from("1.3.6.1.2.1.2.2.1.10.5")).is_none());

        let mta = provider.profile_for(DeviceType::Mta, 33_000);
        assert!(mta.get(&Oid::from("1.3.6.1.2.1.2.2.1.10.1")).is_some());
        assert!(mta.get(&Oid::from("1.3.6.1.2.1.2.2.1.10.2")).is_none());
    }

    #[test]
    fn test_sysname_embeds_port() {
        let provider = SyntheticProfiles;
        let profile = provider.profile_for(DeviceType::Router, 34_567);
        let entry = profile.get(&Oid::from("1.3.6.1.2.1.1.5.0")).unwrap();
        assert_eq!(entry.datum.to_value().as_text(), Some("router-34567"));
    }
}
