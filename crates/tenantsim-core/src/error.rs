//! Error types for Tenantsim

use thiserror::Error;

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors raised while building a cluster, generating a workload or running a policy.
///
/// Every error is local to the run that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The hosts cannot accommodate the requested VMs
    #[error("Capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: String, available: String },

    /// Non-positive job length, empty VM pool or zero-capacity VM
    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    /// Policy name not recognised by the driver
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    /// Records requested while jobs are still queued or running
    #[error("Simulation not quiescent: {in_flight} jobs still in flight")]
    NotQuiescent { in_flight: usize },

    /// A policy run stopped abnormally before reaching quiescence
    #[error("Run aborted: {0}")]
    RunAborted(String),

    /// Inconsistent scenario parameters
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SimulationError {
    /// Create a capacity error from any displayable amounts
    pub fn capacity(requested: impl ToString, available: impl ToString) -> Self {
        Self::CapacityExceeded {
            requested: requested.to_string(),
            available: available.to_string(),
        }
    }

    /// Create an invalid workload error
    pub fn invalid_workload(msg: impl Into<String>) -> Self {
        Self::InvalidWorkload(msg.into())
    }

    /// Create a run-aborted error
    pub fn run_aborted(msg: impl Into<String>) -> Self {
        Self::RunAborted(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimulationError::capacity("5000 MIPS", "3000 MIPS");
        assert_eq!(
            err.to_string(),
            "Capacity exceeded: requested 5000 MIPS, available 3000 MIPS"
        );

        let err = SimulationError::UnknownPolicy("Lottery".to_string());
        assert_eq!(err.to_string(), "Unknown policy: Lottery");

        let err = SimulationError::NotQuiescent { in_flight: 3 };
        assert!(err.to_string().contains("3 jobs"));

        let err = SimulationError::run_aborted("index out of bounds");
        assert_eq!(err.to_string(), "Run aborted: index out of bounds");
    }
}
