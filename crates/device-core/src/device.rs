//! Device type taxonomy and static per-type characteristics

use serde::{Deserialize, Serialize};

/// Closed set of simulated device types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Subscriber-side DOCSIS cable modem
    CableModem,
    /// Embedded multimedia terminal adapter (voice over DOCSIS)
    Mta,
    /// Cable modem termination system head-end
    Cmts,
    /// Access or aggregation Ethernet switch
    Switch,
    /// IP router
    Router,
    /// General-purpose server host
    Server,
}

impl DeviceType {
    /// All device types in the deterministic ordering used for port
    /// assignment
    pub const ALL: [DeviceType; 6] = [
        DeviceType::CableModem,
        DeviceType::Mta,
        DeviceType::Cmts,
        DeviceType::Switch,
        DeviceType::Router,
        DeviceType::Server,
    ];

    /// Stable lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::CableModem => "cable_modem",
            DeviceType::Mta => "mta",
            DeviceType::Cmts => "cmts",
            DeviceType::Switch => "switch",
            DeviceType::Router => "router",
            DeviceType::Server => "server",
        }
    }

    /// Static characteristics for this type
    pub fn characteristics(&self) -> &'static DeviceCharacteristics {
        match self {
            DeviceType::CableModem => &CABLE_MODEM,
            DeviceType::Mta => &MTA,
            DeviceType::Cmts => &CMTS,
            DeviceType::Switch => &SWITCH,
            DeviceType::Router => &ROUTER,
            DeviceType::Server => &SERVER,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable per-type metadata consumed by profile generation and the
/// value engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCharacteristics {
    /// Typical interface count exposed in the interface table
    pub typical_interfaces: u16,
    /// Whether the device reports RF signal metrics (SNR, power)
    pub signal_monitoring: bool,
    /// Expected uptime between restarts, in days
    pub expected_uptime_days: u32,
    /// Baseline operating temperature in Celsius
    pub baseline_temperature_c: f64,
    /// System description string reported at sysDescr
    pub description: &'static str,
}

const CABLE_MODEM: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 2,
    signal_monitoring: true,
    expected_uptime_days: 30,
    baseline_temperature_c: 38.0,
    description: "DOCSIS 3.1 cable modem",
};

const MTA: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 1,
    signal_monitoring: true,
    expected_uptime_days: 45,
    baseline_temperature_c: 36.0,
    description: "Embedded PacketCable MTA",
};

const CMTS: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 64,
    signal_monitoring: true,
    expected_uptime_days: 365,
    baseline_temperature_c: 45.0,
    description: "Integrated CMTS head-end",
};

const SWITCH: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 48,
    signal_monitoring: false,
    expected_uptime_days: 180,
    baseline_temperature_c: 35.0,
    description: "48-port managed Ethernet switch",
};

const ROUTER: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 16,
    signal_monitoring: false,
    expected_uptime_days: 270,
    baseline_temperature_c: 40.0,
    description: "Modular edge router",
};

const SERVER: DeviceCharacteristics = DeviceCharacteristics {
    typical_interfaces: 4,
    signal_monitoring: false,
    expected_uptime_days: 90,
    baseline_temperature_c: 42.0,
    description: "Rack-mount server host",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_count_relations() {
        let cm = DeviceType::CableModem.characteristics();
        let switch = DeviceType::Switch.characteristics();
        let cmts = DeviceType::Cmts.characteristics();

        assert!(switch.typical_interfaces > cm.typical_interfaces);
        assert!(cmts.typical_interfaces > cm.typical_interfaces);
    }

    #[test]
    fn test_uptime_relations() {
        let cm = DeviceType::CableModem.characteristics();
        let switch = DeviceType::Switch.characteristics();
        let cmts = DeviceType::Cmts.characteristics();

        assert!(cmts.expected_uptime_days >= switch.expected_uptime_days);
        assert!(switch.expected_uptime_days >= cm.expected_uptime_days);
    }

    #[test]
    fn test_signal_monitoring_flags() {
        assert!(DeviceType::CableModem.characteristics().signal_monitoring);
        assert!(DeviceType::Cmts.characteristics().signal_monitoring);
        assert!(!DeviceType::Switch.characteristics().signal_monitoring);
        assert!(!DeviceType::Router.characteristics().signal_monitoring);
    }

    #[test]
    fn test_display_matches_serde() {
        for ty in DeviceType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{ty}\""));
        }
    }

    #[test]
    fn test_all_is_exhaustive_and_unique() {
        for (i, a) in DeviceType::ALL.iter().enumerate() {
            for b in &DeviceType::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
