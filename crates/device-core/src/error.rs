//! Distribution error types

use thiserror::Error;

/// Errors raised while building or validating port assignments
#[derive(Debug, Error)]
pub enum DistributionError {
    /// The candidate port range cannot hold the requested population
    #[error("insufficient ports: {required} required, {available} available")]
    InsufficientPorts {
        /// Total ports the mix requires
        required: usize,
        /// Ports available in the candidate range
        available: usize,
    },

    /// Two type slices claim the same port
    #[error("overlapping assignments at port {port}")]
    OverlappingAssignments {
        /// First port shared by two slices
        port: u16,
    },

    /// A slice reaches outside the declared port universe
    #[error("port {port} lies outside the declared universe")]
    PortOutsideUniverse {
        /// Offending port
        port: u16,
    },

    /// An assignment slice is inverted (start above end)
    #[error("invalid slice for {device_type}: start {start} above end {end}")]
    InvalidSlice {
        /// Type the slice was built for
        device_type: crate::DeviceType,
        /// Slice start port
        start: u16,
        /// Slice end port
        end: u16,
    },
}

/// Result type for distribution operations
pub type Result<T> = std::result::Result<T, DistributionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceType;

    #[test]
    fn test_error_display() {
        let err = DistributionError::InsufficientPorts {
            required: 200,
            available: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient ports: 200 required, 100 available"
        );

        let err = DistributionError::OverlappingAssignments { port: 30_050 };
        assert_eq!(err.to_string(), "overlapping assignments at port 30050");

        let err = DistributionError::InvalidSlice {
            device_type: DeviceType::Switch,
            start: 90,
            end: 10,
        };
        assert!(err.to_string().contains("switch"));
    }
}
