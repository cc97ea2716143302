//! Time-shared execution on a single VM
//!
//! Every resident job runs concurrently. A VM with `P` PEs of `M` MIPS hosting
//! jobs that request `p_1..p_n` PEs gives job `i` a rate of
//! `M × p_i × min(1, P / Σp)`: jobs never run faster than the PEs they asked
//! for, and the VM never hands out more than `M × P` in total. Rates are
//! recomputed whenever the resident set changes, so finish times are exact
//! rather than quantized to a time slice.

use tenantsim_core::JobId;

/// Remaining work below this many instructions counts as done.
/// Absorbs float drift when the clock lands exactly on a completion instant.
const COMPLETION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
struct ResidentJob {
    job_id: JobId,
    pes: u32,
    remaining: f64,
}

/// Processor-sharing scheduler owned by one VM
#[derive(Debug, Clone)]
pub struct TimeSharedScheduler {
    mips_per_pe: f64,
    pes: u32,
    resident: Vec<ResidentJob>,
}

impl TimeSharedScheduler {
    pub fn new(mips_per_pe: f64, pes: u32) -> Self {
        TimeSharedScheduler {
            mips_per_pe,
            pes,
            resident: Vec::new(),
        }
    }

    /// Aggregate capacity in MIPS
    pub fn capacity(&self) -> f64 {
        self.mips_per_pe * self.pes as f64
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Admit a job with `length` instructions still to execute
    pub fn admit(&mut self, job_id: JobId, pes: u32, length: f64) {
        self.resident.push(ResidentJob {
            job_id,
            pes: pes.max(1),
            remaining: length,
        });
    }

    fn requested_pes(&self) -> u32 {
        self.resident.iter().map(|j| j.pes).sum()
    }

    /// Fraction of each requested PE actually granted
    fn pe_fraction(&self) -> f64 {
        let requested = self.requested_pes();
        if requested == 0 {
            return 0.0;
        }
        (self.pes as f64 / requested as f64).min(1.0)
    }

    fn rate_of(&self, job: &ResidentJob, fraction: f64) -> f64 {
        self.mips_per_pe * job.pes as f64 * fraction
    }

    /// Current execution rate (MIPS) of a resident job
    #[cfg(test)]
    pub fn rate(&self, job_id: JobId) -> Option<f64> {
        let fraction = self.pe_fraction();
        self.resident
            .iter()
            .find(|j| j.job_id == job_id)
            .map(|j| self.rate_of(j, fraction))
    }

    /// Sum of all current rates; never exceeds [`capacity`](Self::capacity)
    pub fn allocated_mips(&self) -> f64 {
        let fraction = self.pe_fraction();
        self.resident.iter().map(|j| self.rate_of(j, fraction)).sum()
    }

    /// Remaining instructions of a resident job
    #[cfg(test)]
    pub fn remaining(&self, job_id: JobId) -> Option<f64> {
        self.resident
            .iter()
            .find(|j| j.job_id == job_id)
            .map(|j| j.remaining)
    }

    /// Time until the earliest resident job completes at current rates
    pub fn next_completion_in(&self) -> Option<f64> {
        let fraction = self.pe_fraction();
        self.resident
            .iter()
            .map(|j| {
                let rate = self.rate_of(j, fraction);
                if rate > 0.0 {
                    j.remaining / rate
                } else {
                    f64::INFINITY
                }
            })
            .filter(|t| t.is_finite())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Run every resident job for `dt` seconds at current rates.
    ///
    /// Returns the number of instructions executed across all jobs.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if dt <= 0.0 || self.resident.is_empty() {
            return 0.0;
        }
        let fraction = self.pe_fraction();
        let mips_per_pe = self.mips_per_pe;
        let mut executed = 0.0;
        for job in &mut self.resident {
            let work = mips_per_pe * job.pes as f64 * fraction * dt;
            let done = work.min(job.remaining);
            job.remaining -= done;
            if job.remaining <= COMPLETION_TOLERANCE {
                job.remaining = 0.0;
            }
            executed += done;
        }
        executed
    }

    /// Remove and return jobs with no work left, in admission order
    pub fn take_finished(&mut self) -> Vec<JobId> {
        let mut finished = Vec::new();
        self.resident.retain(|j| {
            if j.remaining <= COMPLETION_TOLERANCE {
                finished.push(j.job_id);
                false
            } else {
                true
            }
        });
        finished
    }
}
