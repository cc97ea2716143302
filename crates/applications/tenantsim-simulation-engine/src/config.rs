//! Scenario configuration
//!
//! The defaults describe the reference scenario: 4 tenants submitting 20 jobs
//! of 40000–49999 instructions (seed 42) to 5 single-PE 1000-MIPS VMs spread
//! over 3 dual-PE 1000-MIPS hosts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tenantsim_core::{Result, SimulationError};

use crate::cluster::ClusterSpec;
use crate::simulator::VmSelection;
use crate::workload::WorkloadSpec;

/// Everything needed to run a set of policies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub cluster: ClusterSpec,
    pub workload: WorkloadSpec,
    pub vm_selection: VmSelection,
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SimulationError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ScenarioConfig = serde_json::from_str(text)
            .map_err(|e| SimulationError::config(format!("invalid scenario: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters that cannot describe a cluster or workload.
    ///
    /// Capacity problems are left to cluster construction, which reports them
    /// as `CapacityExceeded`.
    pub fn validate(&self) -> Result<()> {
        self.workload.validate()?;

        let cluster = &self.cluster;
        if cluster.vm_count > 0 && cluster.host_count == 0 {
            return Err(SimulationError::config("VMs need at least one host"));
        }
        if cluster.host_count > 0 && (cluster.pes_per_host == 0 || !(cluster.host_mips > 0.0)) {
            return Err(SimulationError::config(
                "hosts need at least one PE with positive MIPS",
            ));
        }
        if !cluster.vm_mips.is_finite() || cluster.vm_mips < 0.0 {
            return Err(SimulationError::config(format!(
                "VM MIPS must be a non-negative number, got {}",
                cluster.vm_mips
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_scenario() {
        let config = ScenarioConfig::default();
        assert_eq!(config.workload.tenant_count, 4);
        assert_eq!(config.workload.job_count, 20);
        assert_eq!(config.workload.seed, 42);
        assert_eq!(config.cluster.host_count, 3);
        assert_eq!(config.cluster.vm_count, 5);
        assert_eq!(config.vm_selection, VmSelection::Cyclic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ScenarioConfig::from_json_str(
            r#"{ "workload": { "job_count": 8, "seed": 9 }, "vm_selection": "least-loaded" }"#,
        )
        .unwrap();

        assert_eq!(config.workload.job_count, 8);
        assert_eq!(config.workload.seed, 9);
        assert_eq!(config.workload.tenant_count, 4);
        assert_eq!(config.cluster, ClusterSpec::default());
        assert_eq!(config.vm_selection, VmSelection::LeastLoaded);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ScenarioConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ScenarioConfig::default();
        config.workload.length_min = 50_000;
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));

        let mut config = ScenarioConfig::default();
        config.cluster.host_count = 0;
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));

        let mut config = ScenarioConfig::default();
        config.cluster.vm_mips = f64::NAN;
        assert!(matches!(config.validate(), Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = ScenarioConfig::from_json_file("/nonexistent/scenario.json").unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }
}
