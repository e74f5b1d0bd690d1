//! Population mixes and port-to-type distribution
//!
//! A `DeviceMix` names how many devices of each type a population holds.
//! `build_port_assignments` carves a candidate port range into contiguous
//! per-type slices in the fixed `DeviceType::ALL` ordering, and
//! `PortAssignments` classifies any port back to its type through a sorted
//! interval index.

use crate::device::DeviceType;
use crate::error::{DistributionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from device type to requested device count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMix {
    counts: BTreeMap<DeviceType, usize>,
}

impl DeviceMix {
    /// Empty mix
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a zero count removes the type
    pub fn with(mut self, device_type: DeviceType, count: usize) -> Self {
        self.set(device_type, count);
        self
    }

    /// Set the count for a type; a zero count removes the type
    pub fn set(&mut self, device_type: DeviceType, count: usize) {
        if count == 0 {
            self.counts.remove(&device_type);
        } else {
            self.counts.insert(device_type, count);
        }
    }

    /// Count for a single type (zero when absent)
    pub fn count(&self, device_type: DeviceType) -> usize {
        self.counts.get(&device_type).copied().unwrap_or(0)
    }

    /// Total devices across all types
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Iterate (type, count) pairs in the deterministic type ordering
    pub fn iter(&self) -> impl Iterator<Item = (DeviceType, usize)> + '_ {
        DeviceType::ALL
            .into_iter()
            .filter_map(|ty| self.counts.get(&ty).map(|&n| (ty, n)))
    }

    /// Flatten into `(type, count)` specs in the deterministic ordering
    pub fn to_specs(&self) -> Vec<(DeviceType, usize)> {
        self.iter().collect()
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<DeviceMix> {
        let mix = match name {
            "small_test" => DeviceMix::new()
                .with(DeviceType::CableModem, 10)
                .with(DeviceType::Switch, 2),
            "medium_test" => DeviceMix::new()
                .with(DeviceType::CableModem, 100)
                .with(DeviceType::Mta, 20)
                .with(DeviceType::Switch, 10)
                .with(DeviceType::Router, 5),
            "large_test" => DeviceMix::new()
                .with(DeviceType::CableModem, 1_000)
                .with(DeviceType::Mta, 200)
                .with(DeviceType::Cmts, 4)
                .with(DeviceType::Switch, 50)
                .with(DeviceType::Router, 20)
                .with(DeviceType::Server, 10),
            "cable_network" => DeviceMix::new()
                .with(DeviceType::CableModem, 2_000)
                .with(DeviceType::Mta, 500)
                .with(DeviceType::Cmts, 8)
                .with(DeviceType::Router, 4),
            "enterprise_network" => DeviceMix::new()
                .with(DeviceType::Switch, 200)
                .with(DeviceType::Router, 50)
                .with(DeviceType::Server, 100),
            "mixed_lab" => DeviceMix::new()
                .with(DeviceType::CableModem, 25)
                .with(DeviceType::Mta, 5)
                .with(DeviceType::Cmts, 1)
                .with(DeviceType::Switch, 5)
                .with(DeviceType::Router, 2)
                .with(DeviceType::Server, 2),
            _ => return None,
        };
        Some(mix)
    }

    /// Names accepted by [`DeviceMix::preset`]
    pub fn preset_names() -> &'static [&'static str] {
        &[
            "small_test",
            "medium_test",
            "large_test",
            "cable_network",
            "enterprise_network",
            "mixed_lab",
        ]
    }
}

/// One contiguous run of ports assigned to a single device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSlice {
    /// Type every port in the slice materializes as
    pub device_type: DeviceType,
    /// First port, inclusive
    pub start: u16,
    /// Last port, inclusive
    pub end: u16,
}

impl PortSlice {
    /// Ports covered by the slice
    pub fn len(&self) -> usize {
        (self.end as usize) - (self.start as usize) + 1
    }

    /// Whether the slice covers no ports (never true for a valid slice)
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    fn contains(&self, port: u16) -> bool {
        self.start <= port && port <= self.end
    }
}

/// Disjoint per-type port slices over a declared port universe
///
/// Classification is O(log n) over the sorted slice index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAssignments {
    slices: Vec<PortSlice>,
    universe: Option<(u16, u16)>,
}

impl PortAssignments {
    /// Assignments covering no ports; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit slices, validating ordering, disjointness, and
    /// universe membership
    pub fn from_slices(mut slices: Vec<PortSlice>, universe: (u16, u16)) -> Result<Self> {
        slices.sort_by_key(|s| s.start);
        let assignments = Self {
            slices,
            universe: Some(universe),
        };
        assignments.validate()?;
        Ok(assignments)
    }

    /// Confirm pairwise disjointness and that all ports lie inside the
    /// declared universe
    pub fn validate(&self) -> Result<()> {
        let mut prev_end: Option<u16> = None;
        for slice in &self.slices {
            if slice.is_empty() {
                return Err(DistributionError::InvalidSlice {
                    device_type: slice.device_type,
                    start: slice.start,
                    end: slice.end,
                });
            }
            if let Some((lo, hi)) = self.universe {
                if slice.start < lo {
                    return Err(DistributionError::PortOutsideUniverse { port: slice.start });
                }
                if slice.end > hi {
                    return Err(DistributionError::PortOutsideUniverse { port: slice.end });
                }
            }
            if let Some(end) = prev_end {
                if slice.start <= end {
                    return Err(DistributionError::OverlappingAssignments { port: slice.start });
                }
            }
            prev_end = Some(slice.end);
        }
        Ok(())
    }

    /// Classify a port into its device type, if assigned
    pub fn device_type_for(&self, port: u16) -> Option<DeviceType> {
        let idx = self.slices.partition_point(|s| s.start <= port);
        if idx == 0 {
            return None;
        }
        let slice = &self.slices[idx - 1];
        slice.contains(port).then_some(slice.device_type)
    }

    /// All ports assigned to a type, in ascending order
    pub fn ports_for(&self, device_type: DeviceType) -> impl Iterator<Item = u16> + '_ {
        self.slices
            .iter()
            .filter(move |s| s.device_type == device_type)
            .flat_map(|s| s.start..=s.end)
    }

    /// Every assigned `(port, type)` pair, in ascending port order
    pub fn iter_ports(&self) -> impl Iterator<Item = (u16, DeviceType)> + '_ {
        self.slices
            .iter()
            .flat_map(|s| (s.start..=s.end).map(move |p| (p, s.device_type)))
    }

    /// Total ports assigned across all types
    pub fn total_ports(&self) -> usize {
        self.slices.iter().map(PortSlice::len).sum()
    }

    /// The underlying slices, sorted by start port
    pub fn slices(&self) -> &[PortSlice] {
        &self.slices
    }

    /// Per-type counts and the largest group
    pub fn density_stats(&self) -> DensityStats {
        let mut per_type: BTreeMap<DeviceType, usize> = BTreeMap::new();
        for slice in &self.slices {
            *per_type.entry(slice.device_type).or_default() += slice.len();
        }
        let largest_group = per_type
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&ty, &count)| (ty, count));
        DensityStats {
            total_devices: self.total_ports(),
            largest_group,
            per_type_counts: per_type,
        }
    }
}

/// Summary of how a population spreads across device types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityStats {
    /// Total assigned ports
    pub total_devices: usize,
    /// Most populous type and its count, when any ports are assigned
    pub largest_group: Option<(DeviceType, usize)>,
    /// Assigned port count per type
    pub per_type_counts: BTreeMap<DeviceType, usize>,
}

/// Assign consecutive port slices from `port_range` to each type in the
/// mix, in the fixed `DeviceType::ALL` ordering
pub fn build_port_assignments(
    mix: &DeviceMix,
    port_range: (u16, u16),
) -> Result<PortAssignments> {
    let (range_start, range_end) = port_range;
    let available = if range_end >= range_start {
        (range_end as usize) - (range_start as usize) + 1
    } else {
        0
    };
    let required = mix.total();
    if required > available {
        return Err(DistributionError::InsufficientPorts {
            required,
            available,
        });
    }

    let mut slices = Vec::new();
    let mut cursor = range_start as u32;
    for (device_type, count) in mix.iter() {
        let start = cursor as u16;
        let end = (cursor + count as u32 - 1) as u16;
        slices.push(PortSlice {
            device_type,
            start,
            end,
        });
        cursor += count as u32;
    }
    PortAssignments::from_slices(slices, port_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_lookup() {
        for name in DeviceMix::preset_names() {
            let mix = DeviceMix::preset(name).expect("preset should resolve");
            assert!(mix.total() > 0, "{name} is empty");
        }
        assert!(DeviceMix::preset("no_such_mix").is_none());
    }

    #[test]
    fn test_small_test_counts() {
        let mix = DeviceMix::preset("small_test").unwrap();
        assert_eq!(mix.count(DeviceType::CableModem), 10);
        assert_eq!(mix.count(DeviceType::Switch), 2);
        assert_eq!(mix.total(), 12);
    }

    #[test]
    fn test_build_assigns_consecutive_slices_in_type_order() {
        let mix = DeviceMix::new()
            .with(DeviceType::CableModem, 100)
            .with(DeviceType::Switch, 10)
            .with(DeviceType::Router, 5);
        let pa = build_port_assignments(&mix, (30_000, 31_000)).unwrap();

        assert_eq!(pa.device_type_for(30_000), Some(DeviceType::CableModem));
        assert_eq!(pa.device_type_for(30_099), Some(DeviceType::CableModem));
        assert_eq!(pa.device_type_for(30_100), Some(DeviceType::Switch));
        assert_eq!(pa.device_type_for(30_109), Some(DeviceType::Switch));
        assert_eq!(pa.device_type_for(30_110), Some(DeviceType::Router));
        assert_eq!(pa.device_type_for(30_114), Some(DeviceType::Router));
        assert_eq!(pa.device_type_for(30_115), None);
        assert_eq!(pa.device_type_for(29_999), None);
        assert_eq!(pa.total_ports(), 115);
    }

    #[test]
    fn test_build_rejects_undersized_range() {
        let mix = DeviceMix::new().with(DeviceType::CableModem, 200);
        let err = build_port_assignments(&mix, (30_000, 30_099)).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::InsufficientPorts {
                required: 200,
                available: 100,
            }
        ));
    }

    #[test]
    fn test_exact_fit_range() {
        let mix = DeviceMix::new().with(DeviceType::CableModem, 100);
        let pa = build_port_assignments(&mix, (30_000, 30_099)).unwrap();
        assert_eq!(pa.total_ports(), 100);
        assert_eq!(pa.device_type_for(30_099), Some(DeviceType::CableModem));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let slices = vec![
            PortSlice {
                device_type: DeviceType::CableModem,
                start: 100,
                end: 199,
            },
            PortSlice {
                device_type: DeviceType::Switch,
                start: 150,
                end: 250,
            },
        ];
        let err = PortAssignments::from_slices(slices, (0, 1000)).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::OverlappingAssignments { port: 150 }
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_universe() {
        let slices = vec![PortSlice {
            device_type: DeviceType::Router,
            start: 100,
            end: 199,
        }];
        let err = PortAssignments::from_slices(slices, (0, 150)).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::PortOutsideUniverse { port: 199 }
        ));
    }

    #[test]
    fn test_classification_consistent_with_slices() {
        let mix = DeviceMix::preset("medium_test").unwrap();
        let pa = build_port_assignments(&mix, (40_000, 41_000)).unwrap();
        for (port, device_type) in pa.iter_ports() {
            assert_eq!(pa.device_type_for(port), Some(device_type));
        }
    }

    #[test]
    fn test_density_stats() {
        let mix = DeviceMix::new()
            .with(DeviceType::CableModem, 50)
            .with(DeviceType::Mta, 10)
            .with(DeviceType::Server, 3);
        let pa = build_port_assignments(&mix, (20_000, 20_999)).unwrap();
        let stats = pa.density_stats();

        assert_eq!(stats.total_devices, 63);
        assert_eq!(stats.largest_group, Some((DeviceType::CableModem, 50)));
        assert_eq!(stats.per_type_counts[&DeviceType::Mta], 10);
        assert_eq!(stats.per_type_counts[&DeviceType::Server], 3);
    }

    #[test]
    fn test_ports_for_type() {
        let mix = DeviceMix::new()
            .with(DeviceType::CableModem, 3)
            .with(DeviceType::Switch, 2);
        let pa = build_port_assignments(&mix, (10_000, 10_100)).unwrap();

        let cm: Vec<u16> = pa.ports_for(DeviceType::CableModem).collect();
        assert_eq!(cm, vec![10_000, 10_001, 10_002]);
        let sw: Vec<u16> = pa.ports_for(DeviceType::Switch).collect();
        assert_eq!(sw, vec![10_003, 10_004]);
        assert_eq!(pa.ports_for(DeviceType::Router).count(), 0);
    }

    #[test]
    fn test_empty_assignments_miss_everything() {
        let pa = PortAssignments::empty();
        assert_eq!(pa.device_type_for(30_000), None);
        assert_eq!(pa.total_ports(), 0);
        assert!(pa.density_stats().largest_group.is_none());
    }

    #[test]
    fn test_range_near_port_space_ceiling() {
        let mix = DeviceMix::new().with(DeviceType::Server, 10);
        let pa = build_port_assignments(&mix, (65_520, 65_535)).unwrap();
        assert_eq!(pa.device_type_for(65_529), Some(DeviceType::Server));
        assert_eq!(pa.device_type_for(65_530), None);
    }
}
