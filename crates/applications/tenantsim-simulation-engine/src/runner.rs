//! Policy runs over a shared, generated workload
//!
//! Each run builds its own hosts, VMs and simulator, so a failing run cannot
//! touch another run's state. Results are only collected once every run has
//! reached quiescence.

use std::any::Any;

use serde::{Deserialize, Serialize};
use tenantsim_core::{PolicyKind, Result, SimulationError};
use tracing::{debug, info, warn};

use crate::cluster::build_cluster;
use crate::config::ScenarioConfig;
use crate::policies::policy_for;
use crate::simulator::Simulator;
use crate::types::{CompletionRecord, Job};
use crate::workload::WorkloadGenerator;

/// Result of running one policy
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub policy: String,
    pub result: Result<Vec<CompletionRecord>>,
}

impl RunOutcome {
    pub fn records(&self) -> Option<&[CompletionRecord]> {
        self.result.as_deref().ok()
    }
}

/// Serializable view of a [`RunOutcome`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub policy: String,
    pub records: Vec<CompletionRecord>,
    pub error: Option<String>,
}

impl From<&RunOutcome> for RunReport {
    fn from(outcome: &RunOutcome) -> Self {
        match &outcome.result {
            Ok(records) => RunReport {
                policy: outcome.policy.clone(),
                records: records.clone(),
                error: None,
            },
            Err(e) => RunReport {
                policy: outcome.policy.clone(),
                records: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Run one policy against `jobs` on a freshly built cluster
pub fn run_policy(
    config: &ScenarioConfig,
    jobs: &[Job],
    kind: PolicyKind,
) -> Result<Vec<CompletionRecord>> {
    let (hosts, vms) = build_cluster(&config.cluster)?;
    debug!(policy = %kind, hosts = hosts.len(), vms = vms.len(), "cluster built");

    let ordered = policy_for(kind).order_jobs(jobs);

    let mut simulator = Simulator::new(vms, config.vm_selection)?;
    simulator.submit(ordered)?;
    simulator.run()?;
    let records = simulator.drain()?;

    info!(
        policy = %kind,
        jobs = records.len(),
        makespan = simulator.current_time(),
        "policy run complete"
    );
    Ok(records)
}

fn run_named(config: &ScenarioConfig, jobs: &[Job], name: &str) -> RunOutcome {
    let kind = match name.parse::<PolicyKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!(policy = name, error = %e, "skipping policy");
            return RunOutcome {
                policy: name.trim().to_string(),
                result: Err(e),
            };
        }
    };

    info!(policy = %kind, "starting simulation");
    let result = run_policy(config, jobs, kind);
    if let Err(e) = &result {
        warn!(policy = %kind, error = %e, "policy run failed");
    }

    RunOutcome {
        policy: kind.name().to_string(),
        result,
    }
}

/// Outcome for a run whose thread panicked, keeping the panic message
fn aborted(policy: &str, payload: Box<dyn Any + Send>) -> RunOutcome {
    let message = if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "simulation thread panicked".to_string()
    };
    warn!(policy, error = %message, "policy run aborted");

    RunOutcome {
        policy: policy.trim().to_string(),
        result: Err(SimulationError::run_aborted(message)),
    }
}

/// Generate the workload once and run every named policy on it.
///
/// Unknown names and failing runs are reported in their own outcome; the
/// remaining policies still run. With `parallel`, runs execute on scoped
/// threads and are returned in the requested order.
pub fn run_policies(
    config: &ScenarioConfig,
    names: &[String],
    parallel: bool,
) -> Result<Vec<RunOutcome>> {
    config.validate()?;
    let jobs = WorkloadGenerator::new(config.workload.clone())?.generate();
    info!(
        jobs = jobs.len(),
        tenants = config.workload.tenant_count,
        seed = config.workload.seed,
        "workload generated"
    );

    if !parallel {
        return Ok(names.iter().map(|name| run_named(config, &jobs, name)).collect());
    }

    let outcomes: Vec<RunOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let jobs = &jobs;
                (name, scope.spawn(move || run_named(config, jobs, name)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                handle.join().unwrap_or_else(|payload| aborted(name, payload))
            })
            .collect()
    });
    Ok(outcomes)
}
