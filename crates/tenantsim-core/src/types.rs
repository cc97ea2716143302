//! Core types shared across Tenantsim components

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SimulationError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a physical host
    HostId
);
id_type!(
    /// Identifier of a virtual machine
    VmId
);
id_type!(
    /// Identifier of a job (cloudlet)
    JobId
);
id_type!(
    /// Identifier of a tenant. Tenants exist only as a grouping key over jobs.
    TenantId
);

/// Job lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created,
    Queued,
    Running,
    Finished,
}

impl JobStatus {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Created, JobStatus::Queued)
                | (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Finished)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Created => write!(f, "CREATED"),
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Job ordering policy applied before submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    RoundRobin,
    ShortestJobFirst,
    TenantAware,
}

impl PolicyKind {
    /// All policies in reporting order
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::RoundRobin,
        PolicyKind::ShortestJobFirst,
        PolicyKind::TenantAware,
    ];

    /// Short name used in reports
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::RoundRobin => "RoundRobin",
            PolicyKind::ShortestJobFirst => "SJF",
            PolicyKind::TenantAware => "TenantAware",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roundrobin" | "round-robin" | "rr" => Ok(PolicyKind::RoundRobin),
            "sjf" | "shortestjobfirst" | "shortest-job-first" => Ok(PolicyKind::ShortestJobFirst),
            "tenantaware" | "tenant-aware" => Ok(PolicyKind::TenantAware),
            _ => Err(SimulationError::UnknownPolicy(s.trim().to_string())),
        }
    }
}
