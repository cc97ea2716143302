//! Tenantsim Simulation Engine
//!
//! Discrete-event simulator for comparing job ordering policies on a
//! multi-tenant FaaS cluster.

pub mod types;
pub mod cluster;
pub mod workload;
pub mod policies;
pub mod engine;
pub mod simulator;
pub mod metrics;
pub mod config;
pub mod runner;

pub use cluster::{ClusterSpec, build_cluster};
pub use config::ScenarioConfig;
pub use metrics::{Comparison, MetricsAggregator, PolicySummary, TenantStats};
pub use policies::{SchedulingPolicy, policy_for};
pub use runner::{RunOutcome, RunReport, run_policies, run_policy};
pub use simulator::{Simulator, VmSelection};
pub use types::{CompletionRecord, CompletionStatus, Host, Job, Vm};
pub use workload::{WorkloadGenerator, WorkloadSpec, generate_jobs};
