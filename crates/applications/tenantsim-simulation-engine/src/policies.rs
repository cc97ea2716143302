//! Job ordering policies
//!
//! A policy only decides the order in which jobs are handed to the broker;
//! VM binding happens afterwards. Implements:
//! - RoundRobin: creation order, relies on cyclic VM binding
//! - ShortestJobFirst: stable ascending sort by length
//! - TenantAware: one job per tenant per round, tenants in id order

use std::collections::{BTreeMap, VecDeque};

use tenantsim_core::{PolicyKind, TenantId};

use crate::types::Job;

/// Scheduling policy trait. Implementations are pure permutations of their input.
pub trait SchedulingPolicy: Send + Sync {
    /// Order jobs for submission
    fn order_jobs(&self, jobs: &[Job]) -> Vec<Job>;

    /// Get policy name
    fn name(&self) -> &str;
}

/// Identity ordering
pub struct RoundRobinPolicy;

impl SchedulingPolicy for RoundRobinPolicy {
    fn order_jobs(&self, jobs: &[Job]) -> Vec<Job> {
        jobs.to_vec()
    }

    fn name(&self) -> &str {
        PolicyKind::RoundRobin.name()
    }
}

/// Shortest length first; equal lengths keep their original relative order
pub struct ShortestJobFirstPolicy;

impl SchedulingPolicy for ShortestJobFirstPolicy {
    fn order_jobs(&self, jobs: &[Job]) -> Vec<Job> {
        let mut ordered = jobs.to_vec();
        // `sort_by_key` is stable
        ordered.sort_by_key(|job| job.length);
        ordered
    }

    fn name(&self) -> &str {
        PolicyKind::ShortestJobFirst.name()
    }
}

/// Round-robin across tenant groups.
///
/// Round `k` emits the `k`-th job of every tenant that still has one, tenants
/// in ascending id order. No tenant gets more than one job ahead of another
/// tenant's next job.
pub struct TenantAwarePolicy;

impl SchedulingPolicy for TenantAwarePolicy {
    fn order_jobs(&self, jobs: &[Job]) -> Vec<Job> {
        let mut groups: BTreeMap<TenantId, VecDeque<&Job>> = BTreeMap::new();
        for job in jobs {
            groups.entry(job.tenant).or_default().push_back(job);
        }

        let mut ordered = Vec::with_capacity(jobs.len());
        while !groups.is_empty() {
            for queue in groups.values_mut() {
                if let Some(job) = queue.pop_front() {
                    ordered.push(job.clone());
                }
            }
            groups.retain(|_, queue| !queue.is_empty());
        }
        ordered
    }

    fn name(&self) -> &str {
        PolicyKind::TenantAware.name()
    }
}

/// Policy implementation for a selector
pub fn policy_for(kind: PolicyKind) -> Box<dyn SchedulingPolicy> {
    match kind {
        PolicyKind::RoundRobin => Box::new(RoundRobinPolicy),
        PolicyKind::ShortestJobFirst => Box::new(ShortestJobFirstPolicy),
        PolicyKind::TenantAware => Box::new(TenantAwarePolicy),
    }
}
