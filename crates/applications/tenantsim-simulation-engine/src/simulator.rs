//! Discrete-event clock for time-shared job execution
//!
//! The clock jumps straight to the next instant at which something changes:
//! either a queued job arrives or the earliest resident job on some VM runs
//! out of work. Between those instants every VM's share rates are constant,
//! so remaining work is updated exactly. At a given instant completions are
//! processed before arrivals.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tenantsim_core::{JobId, JobStatus, Result, SimulationError, VmId};
use tracing::{debug, trace};

use crate::types::{CapacitySample, CompletionRecord, Event, Job, Vm};

/// Rule binding an arriving job to a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VmSelection {
    /// The n-th admitted job goes to VM `n mod vm_count`
    #[default]
    Cyclic,

    /// The VM with the fewest resident jobs, lowest id on ties
    LeastLoaded,
}

/// Timed event wrapper for priority queue ordering
#[derive(Debug, Clone)]
struct TimedEvent {
    time: f64,
    seq: u64,
    event: Event,
}

// Priority queue orders by time (earliest first), then submission sequence
impl Ord for TimedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for TimedEvent {}

impl PartialEq for TimedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// Discrete-event simulator for one policy run
pub struct Simulator {
    current_time: f64,
    event_queue: BinaryHeap<TimedEvent>,
    vms: Vec<Vm>,
    jobs: BTreeMap<JobId, Job>,
    selection: VmSelection,

    next_seq: u64,
    admitted: usize,
    in_flight: usize,

    events: Vec<Event>,
    samples: Vec<CapacitySample>,
}

impl Simulator {
    /// Create a simulator over a VM pool.
    ///
    /// Fails with `InvalidWorkload` if the pool is empty or any VM has no capacity.
    pub fn new(vms: Vec<Vm>, selection: VmSelection) -> Result<Self> {
        if vms.is_empty() {
            return Err(SimulationError::invalid_workload("VM pool is empty"));
        }
        if let Some(vm) = vms.iter().find(|vm| !(vm.capacity() > 0.0)) {
            return Err(SimulationError::invalid_workload(format!(
                "VM {} has no capacity ({} PE × {} MIPS)",
                vm.id, vm.pes, vm.mips
            )));
        }

        Ok(Simulator {
            current_time: 0.0,
            event_queue: BinaryHeap::new(),
            vms,
            jobs: BTreeMap::new(),
            selection,
            next_seq: 0,
            admitted: 0,
            in_flight: 0,
            events: Vec::new(),
            samples: Vec::new(),
        })
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// Processed events, in the order they took effect
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Per-VM work done between consecutive clock instants
    pub fn capacity_samples(&self) -> &[CapacitySample] {
        &self.samples
    }

    /// Number of jobs QUEUED or RUNNING
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_quiescent(&self) -> bool {
        self.in_flight == 0
    }

    /// Submit jobs in the given order. Each job becomes QUEUED and arrives
    /// at its `submit_time`; ties are admitted in submission order.
    ///
    /// Validates the whole batch before queueing any of it.
    pub fn submit(&mut self, jobs: Vec<Job>) -> Result<()> {
        for (i, job) in jobs.iter().enumerate() {
            if job.length == 0 {
                return Err(SimulationError::invalid_workload(format!(
                    "job {} has non-positive length",
                    job.id
                )));
            }
            if job.pes == 0 {
                return Err(SimulationError::invalid_workload(format!(
                    "job {} requests zero PEs",
                    job.id
                )));
            }
            if job.status != JobStatus::Created {
                return Err(SimulationError::invalid_workload(format!(
                    "job {} already {}",
                    job.id, job.status
                )));
            }
            if !job.submit_time.is_finite() || job.submit_time < self.current_time {
                return Err(SimulationError::invalid_workload(format!(
                    "job {} submitted at {} before clock time {}",
                    job.id, job.submit_time, self.current_time
                )));
            }
            if self.jobs.contains_key(&job.id) || jobs[..i].iter().any(|j| j.id == job.id) {
                return Err(SimulationError::invalid_workload(format!(
                    "duplicate job id {}",
                    job.id
                )));
            }
        }

        for mut job in jobs {
            job.advance(JobStatus::Queued);
            let time = job.submit_time;
            let job_id = job.id;
            self.event_queue.push(TimedEvent {
                time,
                seq: self.next_seq,
                event: Event::JobArrival { job_id, time },
            });
            self.next_seq += 1;
            self.in_flight += 1;
            self.jobs.insert(job_id, job);
        }
        Ok(())
    }

    /// Advance the clock until no job is queued or running
    pub fn run(&mut self) -> Result<()> {
        while let Some((next_time, dt)) = self.next_step() {
            self.advance_to(next_time, dt);
            self.complete_finished_jobs();
            self.admit_arrivals();
        }

        if self.in_flight > 0 {
            // Only reachable if a resident job can never finish
            return Err(SimulationError::invalid_workload(format!(
                "{} jobs cannot make progress",
                self.in_flight
            )));
        }

        debug!(time = self.current_time, "simulation quiescent");
        Ok(())
    }

    /// Hand over completion records in job-id order.
    ///
    /// Only allowed once the run is quiescent. Drained jobs are removed.
    pub fn drain(&mut self) -> Result<Vec<CompletionRecord>> {
        if self.in_flight > 0 {
            return Err(SimulationError::NotQuiescent {
                in_flight: self.in_flight,
            });
        }
        let jobs = std::mem::take(&mut self.jobs);
        Ok(jobs.values().filter_map(CompletionRecord::from_job).collect())
    }

    /// Next clock instant and the step that reaches it.
    ///
    /// The step is kept apart from the instant: near a large clock value
    /// `current_time + dt` can round back to `current_time`, but the
    /// schedulers must still run for `dt`.
    fn next_step(&self) -> Option<(f64, f64)> {
        let next_arrival = self.event_queue.peek().map(|e| e.time);
        let next_completion = self
            .vms
            .iter()
            .filter_map(|vm| vm.scheduler.next_completion_in())
            .min_by(|a, b| a.total_cmp(b));

        match (next_arrival, next_completion) {
            (Some(at), Some(dt)) if at - self.current_time < dt => {
                Some((at, at - self.current_time))
            }
            (Some(at), Some(dt)) => Some(((self.current_time + dt).min(at), dt)),
            (None, Some(dt)) => Some((self.current_time + dt, dt)),
            (Some(at), None) => Some((at, at - self.current_time)),
            (None, None) => None,
        }
    }

    fn advance_to(&mut self, time: f64, dt: f64) {
        if dt > 0.0 {
            for vm in &mut self.vms {
                if vm.scheduler.is_empty() {
                    continue;
                }
                let active_jobs = vm.scheduler.len();
                let allocated_mips = vm.scheduler.allocated_mips();
                let instructions = vm.scheduler.advance(dt);
                self.samples.push(CapacitySample {
                    vm_id: vm.id,
                    from: self.current_time,
                    to: time,
                    elapsed: dt,
                    active_jobs,
                    allocated_mips,
                    instructions,
                });
            }
        }
        self.current_time = time;
    }

    fn complete_finished_jobs(&mut self) {
        let now = self.current_time;
        for vm in &mut self.vms {
            for job_id in vm.scheduler.take_finished() {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.advance(JobStatus::Finished);
                    job.finish_time = Some(now);
                    self.in_flight -= 1;
                    trace!(job = %job_id, vm = %vm.id, time = now, "job finished");
                    self.events.push(Event::JobCompletion {
                        job_id,
                        vm_id: vm.id,
                        time: now,
                    });
                }
            }
        }
    }

    fn admit_arrivals(&mut self) {
        while self
            .event_queue
            .peek()
            .is_some_and(|e| e.time <= self.current_time)
        {
            let Some(timed) = self.event_queue.pop() else {
                break;
            };
            if let Event::JobArrival { job_id, .. } = timed.event {
                self.admit(job_id);
            }
            self.events.push(timed.event);
        }
    }

    fn select_vm(&self) -> usize {
        match self.selection {
            VmSelection::Cyclic => self.admitted % self.vms.len(),
            VmSelection::LeastLoaded => self
                .vms
                .iter()
                .enumerate()
                .min_by_key(|(_, vm)| vm.resident_jobs())
                .map(|(i, _)| i)
                .unwrap_or(0),
        }
    }

    fn admit(&mut self, job_id: JobId) {
        let slot = self.select_vm();
        let now = self.current_time;
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };

        let vm = &mut self.vms[slot];
        vm.scheduler.admit(job_id, job.pes, job.length as f64);
        job.advance(JobStatus::Running);
        job.vm = Some(vm.id);
        job.start_time = Some(now);
        self.admitted += 1;

        trace!(job = %job_id, vm = %vm.id, tenant = %job.tenant, time = now, "job admitted");
    }

    /// VM a job was bound to, if admitted
    pub fn vm_of(&self, job_id: JobId) -> Option<VmId> {
        self.jobs.get(&job_id).and_then(|j| j.vm)
    }
}
