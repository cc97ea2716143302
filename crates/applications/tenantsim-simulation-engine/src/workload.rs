//! Seeded synthetic workload generation
//!
//! Every policy run must see the same jobs, so generation is driven by a
//! seeded `StdRng`: one seed always yields the same lengths and tenants.

use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tenantsim_core::{JobId, Result, SimulationError, TenantId};

use crate::types::Job;

/// Parameters of a generated workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadSpec {
    pub job_count: u32,
    pub tenant_count: u32,
    /// Inclusive bounds on job length (instructions)
    pub length_min: u64,
    pub length_max: u64,
    pub seed: u64,
    pub file_size: u64,
    pub output_size: u64,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        WorkloadSpec {
            job_count: 20,
            tenant_count: 4,
            length_min: 40_000,
            length_max: 49_999,
            seed: 42,
            file_size: 300,
            output_size: 300,
        }
    }
}

impl WorkloadSpec {
    pub fn validate(&self) -> Result<()> {
        if self.length_min == 0 {
            return Err(SimulationError::invalid_workload(
                "job length must be positive (length_min = 0)",
            ));
        }
        if self.length_min > self.length_max {
            return Err(SimulationError::config(format!(
                "length_min {} exceeds length_max {}",
                self.length_min, self.length_max
            )));
        }
        if self.job_count > 0 && self.tenant_count == 0 {
            return Err(SimulationError::config(
                "jobs need at least one tenant to belong to",
            ));
        }
        Ok(())
    }
}

/// Job generator. Lengths are uniform over `[length_min, length_max]`,
/// tenants uniform over `[0, tenant_count)`.
pub struct WorkloadGenerator {
    spec: WorkloadSpec,
    rng: StdRng,
}

impl WorkloadGenerator {
    pub fn new(spec: WorkloadSpec) -> Result<Self> {
        spec.validate()?;
        let rng = StdRng::seed_from_u64(spec.seed);
        Ok(WorkloadGenerator { spec, rng })
    }

    /// Generate the full job list, ids `0..job_count` in creation order
    pub fn generate(&mut self) -> Vec<Job> {
        if self.spec.job_count == 0 {
            return Vec::new();
        }
        let lengths = Uniform::new_inclusive(self.spec.length_min, self.spec.length_max);
        let tenants = Uniform::new(0, self.spec.tenant_count);

        (0..self.spec.job_count)
            .map(|i| {
                // Length first, then tenant: one draw pair per job
                let length = lengths.sample(&mut self.rng);
                let tenant = TenantId(tenants.sample(&mut self.rng));

                let mut job = Job::new(JobId(i), length, tenant);
                job.file_size = self.spec.file_size;
                job.output_size = self.spec.output_size;
                job
            })
            .collect()
    }
}

/// Generate `count` jobs for `tenant_count` tenants from `seed`
pub fn generate_jobs(
    count: u32,
    tenant_count: u32,
    length_min: u64,
    length_max: u64,
    seed: u64,
) -> Result<Vec<Job>> {
    let spec = WorkloadSpec {
        job_count: count,
        tenant_count,
        length_min,
        length_max,
        seed,
        ..Default::default()
    };
    Ok(WorkloadGenerator::new(spec)?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_jobs() {
        let a = generate_jobs(50, 4, 40_000, 49_999, 7).unwrap();
        let b = generate_jobs(50, 4, 40_000, 49_999, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_jobs() {
        let a = generate_jobs(50, 4, 40_000, 49_999, 1).unwrap();
        let b = generate_jobs(50, 4, 40_000, 49_999, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_values_within_bounds() {
        let jobs = generate_jobs(200, 3, 100, 150, 11).unwrap();

        assert_eq!(jobs.len(), 200);
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(job.id, JobId(i as u32));
            assert!((100..=150).contains(&job.length));
            assert!(job.tenant.0 < 3);
            assert_eq!(job.pes, 1);
        }
    }

    #[test]
    fn test_fixed_length_range() {
        let jobs = generate_jobs(5, 2, 1000, 1000, 0).unwrap();
        assert!(jobs.iter().all(|j| j.length == 1000));
    }

    #[test]
    fn test_empty_workload() {
        assert!(generate_jobs(0, 0, 1, 1, 42).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            generate_jobs(5, 2, 0, 10, 0),
            Err(SimulationError::InvalidWorkload(_))
        ));
        assert!(matches!(
            generate_jobs(5, 2, 10, 5, 0),
            Err(SimulationError::Config(_))
        ));
        assert!(matches!(
            generate_jobs(5, 0, 10, 20, 0),
            Err(SimulationError::Config(_))
        ));
    }
}
