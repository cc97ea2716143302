//! Core types for the simulation engine

use serde::{Deserialize, Serialize};
use tenantsim_core::{HostId, JobId, JobStatus, TenantId, VmId};

use crate::engine::TimeSharedScheduler;

/// A physical host. Immutable once the cluster is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub pes: u32,
    pub mips_per_pe: f64,
    pub ram_mb: u32,
    pub bandwidth: u64,
    pub storage: u64,
    /// VMs placed on this host, in placement order
    pub vm_ids: Vec<VmId>,
}

impl Host {
    /// Aggregate MIPS budget (PEs × per-PE MIPS)
    pub fn total_mips(&self) -> f64 {
        self.mips_per_pe * self.pes as f64
    }
}

/// A virtual machine placed on exactly one host, with a time-shared job scheduler.
#[derive(Debug, Clone)]
pub struct Vm {
    pub id: VmId,
    pub host: HostId,
    /// MIPS of each PE
    pub mips: f64,
    pub pes: u32,
    pub ram_mb: u32,
    pub bandwidth: u64,
    pub size: u64,
    pub(crate) scheduler: TimeSharedScheduler,
}

impl Vm {
    pub fn new(
        id: VmId,
        host: HostId,
        mips: f64,
        pes: u32,
        ram_mb: u32,
        bandwidth: u64,
        size: u64,
    ) -> Self {
        Vm {
            id,
            host,
            mips,
            pes,
            ram_mb,
            bandwidth,
            size,
            scheduler: TimeSharedScheduler::new(mips, pes),
        }
    }

    /// Aggregate MIPS capacity (PEs × per-PE MIPS)
    pub fn capacity(&self) -> f64 {
        self.mips * self.pes as f64
    }

    /// Number of jobs currently resident
    pub fn resident_jobs(&self) -> usize {
        self.scheduler.len()
    }
}

/// A unit of tenant work (cloudlet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Length in instructions
    pub length: u64,
    pub pes: u32,
    pub file_size: u64,
    pub output_size: u64,
    pub tenant: TenantId,
    pub submit_time: f64,
    pub status: JobStatus,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
    pub vm: Option<VmId>,
}

impl Job {
    pub fn new(id: JobId, length: u64, tenant: TenantId) -> Self {
        Job {
            id,
            length,
            pes: 1,
            file_size: 300,
            output_size: 300,
            tenant,
            submit_time: 0.0,
            status: JobStatus::Created,
            start_time: None,
            finish_time: None,
            vm: None,
        }
    }

    /// Set the submission instant (defaults to 0)
    pub fn with_submit_time(mut self, time: f64) -> Self {
        self.submit_time = time;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Finished
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, JobStatus::Queued | JobStatus::Running)
    }

    /// Move to the next lifecycle state
    pub(crate) fn advance(&mut self, next: JobStatus) {
        debug_assert!(
            self.status.can_advance_to(next),
            "job {} cannot move from {} to {}",
            self.id,
            self.status,
            next
        );
        self.status = next;
    }

    /// Execution time (finish − start), once finished
    pub fn exec_time(&self) -> Option<f64> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => Some(finish - start),
            _ => None,
        }
    }
}

/// Outcome written into a completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    #[serde(rename = "SUCCESS")]
    Success,
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionStatus::Success => write!(f, "SUCCESS"),
        }
    }
}

/// Header matching [`CompletionRecord::to_csv_row`]
pub const CSV_HEADER: &str = "CloudletID,Status,VMId,StartTime,FinishTime,ExecTime,TenantID";

/// Immutable record of a finished job, handed to reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub job_id: JobId,
    pub status: CompletionStatus,
    pub vm_id: VmId,
    pub start_time: f64,
    pub finish_time: f64,
    pub exec_time: f64,
    pub tenant_id: TenantId,
    pub length: u64,
    pub submit_time: f64,
}

impl CompletionRecord {
    /// Build a record from a finished job. Returns `None` for jobs that have not finished.
    pub fn from_job(job: &Job) -> Option<Self> {
        if !job.is_finished() {
            return None;
        }
        let start_time = job.start_time?;
        let finish_time = job.finish_time?;
        Some(CompletionRecord {
            job_id: job.id,
            status: CompletionStatus::Success,
            vm_id: job.vm?,
            start_time,
            finish_time,
            exec_time: finish_time - start_time,
            tenant_id: job.tenant,
            length: job.length,
            submit_time: job.submit_time,
        })
    }

    /// Time between submission and admission
    pub fn queue_delay(&self) -> f64 {
        self.start_time - self.submit_time
    }

    /// One CSV row, times rounded to 2 dp
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{:.2},{:.2},{:.2},{}",
            self.job_id,
            self.status,
            self.vm_id,
            self.start_time,
            self.finish_time,
            self.exec_time,
            self.tenant_id
        )
    }
}

/// Simulation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    JobArrival { job_id: JobId, time: f64 },
    JobCompletion { job_id: JobId, vm_id: VmId, time: f64 },
}

/// Work done by one VM between two consecutive clock instants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySample {
    pub vm_id: VmId,
    pub from: f64,
    pub to: f64,
    /// Step length in seconds. Can exceed `to - from` when the step is
    /// below the float resolution of the clock.
    pub elapsed: f64,
    pub active_jobs: usize,
    /// Sum of job rates over the step
    pub allocated_mips: f64,
    pub instructions: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_job() -> Job {
        let mut job = Job::new(JobId(3), 42_000, TenantId(1));
        job.status = JobStatus::Finished;
        job.vm = Some(VmId(2));
        job.start_time = Some(0.1);
        job.finish_time = Some(84.1);
        job
    }

    #[test]
    fn test_job_defaults() {
        let job = Job::new(JobId(0), 40_000, TenantId(2));
        assert_eq!(job.status, JobStatus::Created);
        assert_eq!(job.pes, 1);
        assert_eq!(job.submit_time, 0.0);
        assert!(job.exec_time().is_none());
        assert!(!job.is_in_flight());
    }

    #[test]
    fn test_record_from_unfinished_job() {
        let job = Job::new(JobId(0), 40_000, TenantId(0));
        assert!(CompletionRecord::from_job(&job).is_none());
    }

    #[test]
    fn test_record_fields() {
        let record = CompletionRecord::from_job(&finished_job()).unwrap();
        assert_eq!(record.job_id, JobId(3));
        assert_eq!(record.vm_id, VmId(2));
        assert_eq!(record.tenant_id, TenantId(1));
        assert!((record.exec_time - 84.0).abs() < 1e-9);
        assert!((record.queue_delay() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_csv_row() {
        let record = CompletionRecord::from_job(&finished_job()).unwrap();
        assert_eq!(record.to_csv_row(), "3,SUCCESS,2,0.10,84.10,84.00,1");
        assert_eq!(CSV_HEADER.split(',').count(), record.to_csv_row().split(',').count());
    }

    #[test]
    fn test_status_serializes_as_success() {
        let json = serde_json::to_string(&CompletionStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
