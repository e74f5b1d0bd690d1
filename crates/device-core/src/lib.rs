//! Device model for the SNMP fleet simulator
//!
//! Defines the device taxonomy, static per-type characteristics, named
//! population mixes, port-to-type distribution, the per-OID behavior
//! descriptors, and the profile/value data model shared by the value
//! engine and the fleet runtime.

pub mod behavior;
pub mod device;
pub mod distribution;
pub mod error;
pub mod profile;
pub mod state;

// Re-export main types
pub use behavior::{BehaviorDescriptor, GaugePattern};
pub use device::{DeviceCharacteristics, DeviceType};
pub use distribution::{build_port_assignments, DensityStats, DeviceMix, PortAssignments, PortSlice};
pub use error::{DistributionError, Result};
pub use profile::{DeviceProfile, Oid, ProfileDatum, ProfileEntry, ProfileValue, SnmpType, SnmpValue};
pub use state::{CounterAccumulator, DeviceState, DeviceStatus};
