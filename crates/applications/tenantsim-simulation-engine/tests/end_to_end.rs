//! Reference scenario: 4 tenants, 20 jobs, 5 VMs on 3 hosts, all three policies

use std::collections::HashMap;

use tenantsim_core::{JobId, PolicyKind, TenantId};
use tenantsim_simulation_engine::{
    CompletionRecord, MetricsAggregator, ScenarioConfig, WorkloadGenerator, run_policies,
    run_policy,
};

fn all_policies() -> Vec<String> {
    PolicyKind::ALL.iter().map(|p| p.name().to_string()).collect()
}

fn total_exec(records: &[CompletionRecord]) -> f64 {
    records.iter().map(|r| r.exec_time).sum()
}

fn sorted_finish_times(records: &[CompletionRecord]) -> Vec<f64> {
    let mut times: Vec<f64> = records.iter().map(|r| r.finish_time).collect();
    times.sort_by(|a, b| a.total_cmp(b));
    times
}

#[test]
fn test_reference_scenario_all_policies() {
    let config = ScenarioConfig::default();
    let jobs = WorkloadGenerator::new(config.workload.clone()).unwrap().generate();
    let expected_length: u64 = jobs.iter().map(|j| j.length).sum();
    let tenant_of: HashMap<JobId, TenantId> = jobs.iter().map(|j| (j.id, j.tenant)).collect();

    let outcomes = run_policies(&config, &all_policies(), false).unwrap();
    assert_eq!(outcomes.len(), 3);

    for outcome in &outcomes {
        let records = outcome.records().expect("run should succeed");
        assert_eq!(records.len(), 20, "{} lost jobs", outcome.policy);
        assert_eq!(records.iter().map(|r| r.length).sum::<u64>(), expected_length);

        // Stable job-id order, tenant preserved end to end
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.job_id, JobId(i as u32));
            assert_eq!(record.tenant_id, tenant_of[&record.job_id]);
            assert!(record.finish_time >= record.start_time);
            assert!((record.exec_time - (record.finish_time - record.start_time)).abs() < 1e-9);
        }
    }

    let rr = outcomes[0].records().unwrap();
    let sjf = outcomes[1].records().unwrap();
    let ta = outcomes[2].records().unwrap();
    assert!(total_exec(sjf) <= total_exec(rr) + 1e-6);
    assert_ne!(sorted_finish_times(rr), sorted_finish_times(sjf));
    assert_ne!(sorted_finish_times(rr), sorted_finish_times(ta));
    assert_ne!(sorted_finish_times(sjf), sorted_finish_times(ta));
}

#[test]
fn test_reference_scenario_is_reproducible() {
    let config = ScenarioConfig::default();
    let first = run_policies(&config, &all_policies(), false).unwrap();
    let second = run_policies(&config, &all_policies(), false).unwrap();

    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.records(), b.records());
    }
}

#[test]
fn test_empty_workload_yields_empty_records() {
    let mut config = ScenarioConfig::default();
    config.workload.job_count = 0;
    let jobs = WorkloadGenerator::new(config.workload.clone()).unwrap().generate();
    assert!(jobs.is_empty());

    for kind in PolicyKind::ALL {
        let records = run_policy(&config, &jobs, kind).unwrap();
        assert!(records.is_empty());
    }
}

#[test]
fn test_comparison_over_reference_runs() {
    let config = ScenarioConfig::default();
    let outcomes = run_policies(&config, &all_policies(), false).unwrap();

    let mut aggregator = MetricsAggregator::new();
    for outcome in &outcomes {
        aggregator.add_run(&outcome.policy, outcome.records().unwrap());
    }
    let comparison = aggregator.compare();

    assert_eq!(comparison.ranking.len(), 3);
    assert!(comparison.ranking.windows(2).all(|w| w[0].1 <= w[1].1));

    // Every tenant that owns jobs gets a verdict
    let tenants_with_jobs = aggregator.summaries()[0].tenants.len();
    assert_eq!(comparison.tenants.len(), tenants_with_jobs);

    for summary in aggregator.summaries() {
        assert_eq!(summary.jobs, 20);
        let per_tenant: usize = summary.tenants.values().map(|t| t.jobs).sum();
        assert_eq!(per_tenant, 20);
        for stats in summary.tenants.values() {
            assert_eq!(stats.total_wait_time, 0.0);
            assert_eq!(stats.total_queue_delay, 0.0);
        }
    }
}
