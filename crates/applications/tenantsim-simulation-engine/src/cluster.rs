//! Static cluster model: hosts, VMs and first-fit VM placement

use serde::{Deserialize, Serialize};
use tenantsim_core::{HostId, Result, SimulationError, VmId};
use tracing::debug;

use crate::types::{Host, Vm};

/// Shape of the cluster to build. Every host and every VM is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSpec {
    pub host_count: u32,
    pub pes_per_host: u32,
    pub host_mips: f64,
    pub host_ram_mb: u32,
    pub host_bandwidth: u64,
    pub host_storage: u64,

    pub vm_count: u32,
    pub vm_mips: f64,
    pub vm_pes: u32,
    pub vm_ram_mb: u32,
    pub vm_bandwidth: u64,
    pub vm_size: u64,
}

impl Default for ClusterSpec {
    fn default() -> Self {
        ClusterSpec {
            host_count: 3,
            pes_per_host: 2,
            host_mips: 1000.0,
            host_ram_mb: 2048,
            host_bandwidth: 10_000,
            host_storage: 1_000_000,
            vm_count: 5,
            vm_mips: 1000.0,
            vm_pes: 1,
            vm_ram_mb: 512,
            vm_bandwidth: 1000,
            vm_size: 10_000,
        }
    }
}

impl ClusterSpec {
    /// Cluster with default RAM, bandwidth and storage figures
    pub fn new(
        host_count: u32,
        pes_per_host: u32,
        vm_count: u32,
        host_mips: f64,
        vm_mips: f64,
    ) -> Self {
        ClusterSpec {
            host_count,
            pes_per_host,
            host_mips,
            vm_count,
            vm_mips,
            ..Default::default()
        }
    }

    /// Total MIPS offered by all hosts
    pub fn host_capacity(&self) -> f64 {
        self.host_count as f64 * self.pes_per_host as f64 * self.host_mips
    }

    /// Total MIPS requested by all VMs
    pub fn vm_demand(&self) -> f64 {
        self.vm_count as f64 * self.vm_pes as f64 * self.vm_mips
    }
}

/// Remaining resources of a host during placement
struct HostBudget {
    mips: f64,
    ram_mb: u32,
    bandwidth: u64,
    storage: u64,
}

impl HostBudget {
    fn of(host: &Host) -> Self {
        HostBudget {
            mips: host.total_mips(),
            ram_mb: host.ram_mb,
            bandwidth: host.bandwidth,
            storage: host.storage,
        }
    }

    fn fits(&self, host: &Host, spec: &ClusterSpec) -> bool {
        let demand = spec.vm_mips * spec.vm_pes as f64;
        spec.vm_pes <= host.pes
            && spec.vm_mips <= host.mips_per_pe
            && demand <= self.mips
            && spec.vm_ram_mb <= self.ram_mb
            && spec.vm_bandwidth <= self.bandwidth
            && spec.vm_size <= self.storage
    }

    fn reserve(&mut self, spec: &ClusterSpec) {
        self.mips -= spec.vm_mips * spec.vm_pes as f64;
        self.ram_mb -= spec.vm_ram_mb;
        self.bandwidth -= spec.vm_bandwidth;
        self.storage -= spec.vm_size;
    }
}

/// Build hosts and place VMs on them first-fit.
///
/// Deterministic for a given spec. Fails with `CapacityExceeded` when the VMs'
/// aggregate MIPS exceed the hosts' or when some VM fits on no host.
pub fn build_cluster(spec: &ClusterSpec) -> Result<(Vec<Host>, Vec<Vm>)> {
    if spec.vm_demand() > spec.host_capacity() {
        return Err(SimulationError::capacity(
            format!("{} MIPS for {} VMs", spec.vm_demand(), spec.vm_count),
            format!("{} MIPS on {} hosts", spec.host_capacity(), spec.host_count),
        ));
    }

    let mut hosts: Vec<Host> = (0..spec.host_count)
        .map(|i| Host {
            id: HostId(i),
            pes: spec.pes_per_host,
            mips_per_pe: spec.host_mips,
            ram_mb: spec.host_ram_mb,
            bandwidth: spec.host_bandwidth,
            storage: spec.host_storage,
            vm_ids: Vec::new(),
        })
        .collect();
    let mut budgets: Vec<HostBudget> = hosts.iter().map(HostBudget::of).collect();

    let mut vms = Vec::with_capacity(spec.vm_count as usize);
    for i in 0..spec.vm_count {
        let vm_id = VmId(i);
        let slot = hosts
            .iter()
            .zip(budgets.iter())
            .position(|(host, budget)| budget.fits(host, spec));

        let Some(slot) = slot else {
            return Err(SimulationError::capacity(
                format!(
                    "VM {} ({} PE × {} MIPS, {} MB RAM)",
                    vm_id, spec.vm_pes, spec.vm_mips, spec.vm_ram_mb
                ),
                format!("no host with room after placing {} VMs", vms.len()),
            ));
        };

        budgets[slot].reserve(spec);
        let host = &mut hosts[slot];
        host.vm_ids.push(vm_id);
        debug!(vm = %vm_id, host = %host.id, "placed VM");

        vms.push(Vm::new(
            vm_id,
            host.id,
            spec.vm_mips,
            spec.vm_pes,
            spec.vm_ram_mb,
            spec.vm_bandwidth,
            spec.vm_size,
        ));
    }

    Ok((hosts, vms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cluster_placement() {
        let (hosts, vms) = build_cluster(&ClusterSpec::default()).unwrap();

        assert_eq!(hosts.len(), 3);
        assert_eq!(vms.len(), 5);

        // First-fit: two 1000-MIPS VMs per 2×1000-MIPS host
        assert_eq!(hosts[0].vm_ids, vec![VmId(0), VmId(1)]);
        assert_eq!(hosts[1].vm_ids, vec![VmId(2), VmId(3)]);
        assert_eq!(hosts[2].vm_ids, vec![VmId(4)]);
        assert_eq!(vms[4].host, HostId(2));
    }

    #[test]
    fn test_no_host_oversubscribed() {
        let spec = ClusterSpec::new(4, 4, 10, 500.0, 500.0);
        let (hosts, vms) = build_cluster(&spec).unwrap();

        for host in &hosts {
            let placed: f64 = vms
                .iter()
                .filter(|vm| vm.host == host.id)
                .map(|vm| vm.capacity())
                .sum();
            assert!(placed <= host.total_mips());
        }
    }

    #[test]
    fn test_aggregate_capacity_exceeded() {
        // 3 hosts × 1 PE × 1000 MIPS cannot carry 5 × 1000 MIPS
        let spec = ClusterSpec::new(3, 1, 5, 1000.0, 1000.0);
        let err = build_cluster(&spec).unwrap_err();
        assert!(matches!(err, SimulationError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_vm_faster_than_host_pe_is_rejected() {
        // Aggregate fits, but a 1500-MIPS PE cannot be carved from a 1000-MIPS PE
        let spec = ClusterSpec::new(2, 4, 1, 1000.0, 1500.0);
        let err = build_cluster(&spec).unwrap_err();
        assert!(matches!(err, SimulationError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_ram_limits_placement() {
        let spec = ClusterSpec {
            vm_ram_mb: 1500,
            ..ClusterSpec::default()
        };
        // Only one 1500 MB VM fits per 2048 MB host
        let err = build_cluster(&spec).unwrap_err();
        assert!(matches!(err, SimulationError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_empty_vm_pool_builds() {
        let spec = ClusterSpec::new(2, 1, 0, 1000.0, 1000.0);
        let (hosts, vms) = build_cluster(&spec).unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(vms.is_empty());
    }
}
