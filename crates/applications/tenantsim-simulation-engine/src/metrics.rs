//! Per-tenant, per-policy summaries over completion records
//!
//! Wait time is `max(0, finish − start − exec)`: time a started job spent not
//! accounted for by its execution. With admission on arrival it is zero up to
//! float noise, which the clamp keeps from going negative. Time between submit
//! and start is tracked separately as queue delay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tenantsim_core::TenantId;

use crate::types::CompletionRecord;

/// Aggregates for one tenant under one policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantStats {
    pub jobs: usize,
    pub total_exec_time: f64,
    pub total_wait_time: f64,
    pub total_queue_delay: f64,
    pub total_length: u64,
}

impl TenantStats {
    fn add(&mut self, record: &CompletionRecord) {
        self.jobs += 1;
        self.total_exec_time += record.exec_time;
        self.total_wait_time += wait_time(record);
        self.total_queue_delay += record.queue_delay().max(0.0);
        self.total_length += record.length;
    }

    pub fn avg_exec_time(&self) -> f64 {
        if self.jobs == 0 {
            0.0
        } else {
            self.total_exec_time / self.jobs as f64
        }
    }

    pub fn avg_wait_time(&self) -> f64 {
        if self.jobs == 0 {
            0.0
        } else {
            self.total_wait_time / self.jobs as f64
        }
    }

    pub fn avg_queue_delay(&self) -> f64 {
        if self.jobs == 0 {
            0.0
        } else {
            self.total_queue_delay / self.jobs as f64
        }
    }
}

/// Wait time of a single record, clamped at zero
pub fn wait_time(record: &CompletionRecord) -> f64 {
    (record.finish_time - record.start_time - record.exec_time).max(0.0)
}

/// Aggregates for one policy run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy: String,
    pub jobs: usize,
    pub total_exec_time: f64,
    pub makespan: f64,
    pub tenants: BTreeMap<TenantId, TenantStats>,
}

impl PolicySummary {
    pub fn from_records(policy: impl Into<String>, records: &[CompletionRecord]) -> Self {
        let mut summary = PolicySummary {
            policy: policy.into(),
            ..Default::default()
        };
        for record in records {
            summary.jobs += 1;
            summary.total_exec_time += record.exec_time;
            summary.makespan = summary.makespan.max(record.finish_time);
            summary.tenants.entry(record.tenant_id).or_default().add(record);
        }
        summary
    }

    pub fn avg_exec_time(&self) -> f64 {
        if self.jobs == 0 {
            0.0
        } else {
            self.total_exec_time / self.jobs as f64
        }
    }
}

/// Best policy for one tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantVerdict {
    pub tenant: TenantId,
    pub best_policy: String,
    pub total_exec_time: f64,
}

/// Cross-policy comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Policies by ascending total execution time
    pub ranking: Vec<(String, f64)>,
    pub tenants: Vec<TenantVerdict>,
}

impl Comparison {
    pub fn best_overall(&self) -> Option<&str> {
        self.ranking.first().map(|(name, _)| name.as_str())
    }
}

/// Collects successful policy runs and compares them
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    summaries: Vec<PolicySummary>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the records of one finished run
    pub fn add_run(&mut self, policy: impl Into<String>, records: &[CompletionRecord]) {
        self.summaries.push(PolicySummary::from_records(policy, records));
    }

    pub fn summaries(&self) -> &[PolicySummary] {
        &self.summaries
    }

    pub fn summary(&self, policy: &str) -> Option<&PolicySummary> {
        self.summaries.iter().find(|s| s.policy == policy)
    }

    /// Rank policies and pick a winner per tenant.
    ///
    /// Lower total execution time wins; ties go to the lexically smaller policy name.
    pub fn compare(&self) -> Comparison {
        let mut ranking: Vec<(String, f64)> = self
            .summaries
            .iter()
            .map(|s| (s.policy.clone(), s.total_exec_time))
            .collect();
        ranking.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut per_tenant: BTreeMap<TenantId, Vec<(&str, f64)>> = BTreeMap::new();
        for summary in &self.summaries {
            for (tenant, stats) in &summary.tenants {
                per_tenant
                    .entry(*tenant)
                    .or_default()
                    .push((summary.policy.as_str(), stats.total_exec_time));
            }
        }

        let tenants = per_tenant
            .into_iter()
            .filter_map(|(tenant, candidates)| {
                candidates
                    .into_iter()
                    .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)))
                    .map(|(policy, total)| TenantVerdict {
                        tenant,
                        best_policy: policy.to_string(),
                        total_exec_time: total,
                    })
            })
            .collect();

        Comparison { ranking, tenants }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompletionStatus;
    use tenantsim_core::{JobId, VmId};

    fn record(id: u32, tenant: u32, start: f64, finish: f64) -> CompletionRecord {
        CompletionRecord {
            job_id: JobId(id),
            status: CompletionStatus::Success,
            vm_id: VmId(0),
            start_time: start,
            finish_time: finish,
            exec_time: finish - start,
            tenant_id: TenantId(tenant),
            length: 1000,
            submit_time: 0.0,
        }
    }

    #[test]
    fn test_policy_summary() {
        let records = vec![
            record(0, 0, 0.0, 10.0),
            record(1, 1, 0.0, 30.0),
            record(2, 0, 5.0, 25.0),
        ];
        let summary = PolicySummary::from_records("RoundRobin", &records);

        assert_eq!(summary.jobs, 3);
        assert!((summary.total_exec_time - 60.0).abs() < 1e-9);
        assert!((summary.makespan - 30.0).abs() < 1e-9);

        let tenant0 = &summary.tenants[&TenantId(0)];
        assert_eq!(tenant0.jobs, 2);
        assert!((tenant0.avg_exec_time() - 15.0).abs() < 1e-9);
        // Job 2 sat 5s before admission, then ran without stalling
        assert_eq!(tenant0.total_wait_time, 0.0);
        assert!((tenant0.total_queue_delay - 5.0).abs() < 1e-9);
        assert!((tenant0.avg_queue_delay() - 2.5).abs() < 1e-9);
        assert_eq!(tenant0.total_length, 2000);
    }

    #[test]
    fn test_wait_time_never_negative() {
        let mut r = record(0, 0, 0.0, 10.0);
        r.exec_time = 10.000_000_1;
        assert_eq!(wait_time(&r), 0.0);
    }

    #[test]
    fn test_wait_time_counts_time_not_executing() {
        // Started at 2, finished at 12, but only 7s of execution recorded
        let mut r = record(0, 0, 2.0, 12.0);
        r.exec_time = 7.0;
        assert!((wait_time(&r) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_and_tenant_verdicts() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.add_run("RoundRobin", &[record(0, 0, 0.0, 40.0), record(1, 1, 0.0, 10.0)]);
        aggregator.add_run("SJF", &[record(0, 0, 0.0, 20.0), record(1, 1, 0.0, 20.0)]);

        let comparison = aggregator.compare();
        assert_eq!(comparison.best_overall(), Some("SJF"));
        assert_eq!(comparison.ranking[1].0, "RoundRobin");

        assert_eq!(comparison.tenants[0].best_policy, "SJF");
        assert_eq!(comparison.tenants[1].best_policy, "RoundRobin");
    }

    #[test]
    fn test_ties_broken_by_policy_name() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.add_run("TenantAware", &[record(0, 0, 0.0, 10.0)]);
        aggregator.add_run("RoundRobin", &[record(0, 0, 0.0, 10.0)]);

        let comparison = aggregator.compare();
        assert_eq!(comparison.best_overall(), Some("RoundRobin"));
        assert_eq!(comparison.tenants[0].best_policy, "RoundRobin");
    }

    #[test]
    fn test_empty_runs() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.add_run("SJF", &[]);
        let comparison = aggregator.compare();
        assert_eq!(comparison.ranking, vec![("SJF".to_string(), 0.0)]);
        assert!(comparison.tenants.is_empty());
        assert_eq!(aggregator.summary("SJF").unwrap().avg_exec_time(), 0.0);
    }
}
