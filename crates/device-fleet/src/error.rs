//! Fleet runtime error types

use thiserror::Error;

/// Errors surfaced by the pool and bulk startup
#[derive(Debug, Error)]
pub enum FleetError {
    /// The port belongs to no configured assignment slice
    #[error("port {port} is outside every configured port range")]
    UnknownPortRange {
        /// Queried port
        port: u16,
    },

    /// Creating one more device would exceed the process-wide cap
    #[error("device pool exhausted at {limit} devices")]
    PoolExhausted {
        /// Configured maximum
        limit: usize,
    },

    /// Port distribution failed
    #[error(transparent)]
    Distribution(#[from] device_core::DistributionError),

    /// The actor task could not be brought up
    #[error("device actor for port {port} failed to start: {reason}")]
    ActorStartFailed {
        /// Port the actor was created for
        port: u16,
        /// Failure description
        reason: String,
    },

    /// The actor terminated or its mailbox is gone
    #[error("device actor for port {port} is no longer running")]
    ActorCrashed {
        /// Port whose actor died
        port: u16,
    },

    /// Bulk startup brought up too small a fraction of the population
    #[error("population incomplete: {created} of {requested} devices started")]
    PopulationIncomplete {
        /// Devices that came up
        created: usize,
        /// Devices requested
        requested: usize,
    },

    /// No preset mix is registered under the given name
    #[error("unknown device mix: {name}")]
    UnknownMix {
        /// Requested preset name
        name: String,
    },
}

/// Result type for fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::UnknownPortRange { port: 12_345 };
        assert_eq!(
            err.to_string(),
            "port 12345 is outside every configured port range"
        );

        let err = FleetError::PoolExhausted { limit: 10_000 };
        assert_eq!(err.to_string(), "device pool exhausted at 10000 devices");

        let err = FleetError::PopulationIncomplete {
            created: 70,
            requested: 100,
        };
        assert!(err.to_string().contains("70 of 100"));
    }

    #[test]
    fn test_distribution_error_conversion() {
        let inner = device_core::DistributionError::InsufficientPorts {
            required: 10,
            available: 5,
        };
        let err: FleetError = inner.into();
        assert!(matches!(err, FleetError::Distribution(_)));
        assert!(err.to_string().contains("insufficient ports"));
    }
}
