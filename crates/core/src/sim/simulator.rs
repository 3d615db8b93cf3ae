//! Simulator: owns the workload, the active memory manager, the scheduler and the peripheral,
//! and advances them together one tick at a time.
//!
//! Each call to [`Simulator::step`] runs, in this order:
//! 1. admission of processes arriving this tick,
//! 2. admission retries for every `New` process that has already arrived,
//! 3. I/O countdowns, unblocking finished processes and releasing the peripheral,
//! 4. preemption of an expired quantum, then dispatch,
//! 5. one tick of execution (or an I/O request) for the running process,
//! 6. metric sampling,
//! 7. scheduler accounting and the tick advance.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::common::{ConfigError, Pid, SimError, Tick};
use crate::config::{Config, MemoryMode};
use crate::mem::{MemoryManager, MemoryUnit};
use crate::process::{Process, ProcessState, ProcessTable};
use crate::resource::SharedResource;
use crate::sched::RoundRobinScheduler;
use crate::sim::workload;
use crate::stats::{History, MemorySummary, RunResults, Snapshot};

/// How a call to [`Simulator::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every process terminated.
    Completed,
    /// `general.max_ticks` elapsed first.
    TickLimit,
}

/// Top-level simulator.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: Config,
    now: Tick,
    procs: ProcessTable,
    memory: MemoryUnit,
    scheduler: RoundRobinScheduler,
    resource: SharedResource,
    arrivals: BTreeMap<Tick, Vec<Pid>>,
    finalized: Vec<Pid>,
    history: History,
}

impl Simulator {
    /// Builds a simulator whose workload is drawn from a generator seeded with
    /// `config.general.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the configuration fails validation.
    pub fn new(config: Config) -> Result<Self, SimError> {
        let mut rng = StdRng::seed_from_u64(config.general.seed);
        Self::with_rng(config, &mut rng)
    }

    /// Builds a simulator whose workload is drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the configuration fails validation.
    pub fn with_rng<R: Rng + ?Sized>(config: Config, rng: &mut R) -> Result<Self, SimError> {
        config.validate()?;
        let procs = workload::synthesize(&config, rng);
        Self::with_workload(config, procs)
    }

    /// Builds a simulator over an explicit workload.
    ///
    /// Processes must be numbered `Pid(1)`, `Pid(2)`, … in order. In paged mode their page
    /// tables must already be sized.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the configuration fails validation, when the pids
    /// are not dense and ordered, or when a paged-mode page table is missing or mis-sized.
    pub fn with_workload(config: Config, procs: Vec<Process>) -> Result<Self, SimError> {
        config.validate()?;
        check_workload(&config, &procs)?;
        let mut arrivals: BTreeMap<Tick, Vec<Pid>> = BTreeMap::new();
        for p in &procs {
            arrivals.entry(p.arrival).or_default().push(p.pid);
        }
        debug!(
            processes = procs.len(),
            mode = ?config.memory.mode,
            seed = config.general.seed,
            "workload ready"
        );
        Ok(Self {
            memory: MemoryUnit::new(&config.memory),
            scheduler: RoundRobinScheduler::new(config.scheduler.quantum),
            resource: SharedResource::new(),
            procs: ProcessTable::new(procs),
            now: 0,
            arrivals,
            finalized: Vec::new(),
            history: History::default(),
            config,
        })
    }

    /// Attempts memory admission; on success hands the process to the scheduler.
    fn try_admit(&mut self, pid: Pid) -> bool {
        if !self.memory.allocate(pid, &mut self.procs) {
            trace!(%pid, tick = self.now, "admission deferred: not enough memory");
            return false;
        }
        if let Some(p) = self.procs.get_mut(pid) {
            self.scheduler.admit(p);
        }
        true
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        let now = self.now;

        // 1. Arrivals.
        let arriving = self.arrivals.get(&now).cloned().unwrap_or_default();
        for pid in arriving {
            if self.procs.get(pid).is_some_and(|p| p.state == ProcessState::New) {
                let _ = self.try_admit(pid);
            }
        }

        // 2. Retries for everything still waiting on memory.
        let pending: Vec<Pid> = self
            .procs
            .iter()
            .filter(|p| p.state == ProcessState::New && p.arrival <= now)
            .map(Process::pid)
            .collect();
        for pid in pending {
            let _ = self.try_admit(pid);
        }

        // 3. I/O completion.
        let blocked: Vec<Pid> = self.scheduler.blocked().collect();
        for pid in blocked {
            let Some(p) = self.procs.get_mut(pid) else {
                continue;
            };
            if p.advance_io() {
                self.scheduler.unblock(p);
                self.resource.release();
            }
        }

        // 4. Scheduling.
        let _ = self.scheduler.preempt_if_due(&mut self.procs);
        let _ = self.scheduler.dispatch(&mut self.procs);

        // 5. Execution.
        if let Some(pid) = self.scheduler.running() {
            self.execute(pid, now);
        }

        // 6. Metrics.
        let usage = self.memory.usage_ratio();
        let secondary = self.memory.secondary_metric();
        self.history.record(usage, secondary);
        trace!(tick = now, usage, secondary = secondary.value(), "tick metrics");

        // 7. Accounting.
        self.scheduler.tick_accounting(&mut self.procs);
        self.now += 1;
    }

    /// Runs one tick of the CPU for `pid`, or starts its I/O if it is due and granted.
    fn execute(&mut self, pid: Pid, now: Tick) {
        let Some(p) = self.procs.get_mut(pid) else {
            return;
        };

        if p.io_due() {
            if self.resource.try_acquire(pid) {
                p.start_io(self.config.io.duration);
                self.scheduler.block(p);
                return;
            }
            trace!(%pid, holder = ?self.resource.holder(), "peripheral busy, continuing");
        }

        if p.execute() {
            self.scheduler.terminate(p, now);
            self.memory.free(pid, &mut self.procs);
            self.finalized.push(pid);
        }
    }

    /// Steps until every process has terminated or `general.max_ticks` ticks have elapsed.
    pub fn run(&mut self) -> RunOutcome {
        while !self.is_finished() {
            if self.now >= self.config.general.max_ticks {
                info!(tick = self.now, finished = self.finalized.len(), "tick limit reached");
                return RunOutcome::TickLimit;
            }
            self.step();
        }
        info!(tick = self.now, "all processes finished");
        RunOutcome::Completed
    }

    /// Compacts contiguous memory now, recording the tick as a compaction marker.
    ///
    /// Returns false, doing nothing, in paged mode.
    pub fn compact(&mut self) -> bool {
        if !self.memory.compact(&mut self.procs) {
            return false;
        }
        self.history.compactions.push(self.now);
        true
    }

    /// True once every process is in the finalized list.
    pub fn is_finished(&self) -> bool {
        self.finalized.len() == self.procs.len()
    }

    /// Ticks completed so far (the tick the next `step` will simulate).
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Configuration of this run.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Every process, terminated or not, in pid order.
    pub fn processes(&self) -> &ProcessTable {
        &self.procs
    }

    /// Looks up a process.
    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.procs.get(pid)
    }

    /// Terminated processes in termination order.
    pub fn finalized(&self) -> &[Pid] {
        &self.finalized
    }

    /// The active memory manager.
    pub fn memory(&self) -> &MemoryUnit {
        &self.memory
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &RoundRobinScheduler {
        &self.scheduler
    }

    /// The shared peripheral.
    pub fn resource(&self) -> &SharedResource {
        &self.resource
    }

    /// Metric history so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current queues and memory state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.now,
            running: self.scheduler.running(),
            ready: self.scheduler.ready().collect(),
            blocked: self.scheduler.blocked().collect(),
            usage: self.memory.usage_ratio(),
            secondary: self.memory.secondary_metric(),
            resource_holder: self.resource.holder(),
            finished: self.finalized.len(),
            memory: self.memory.view(),
        }
    }

    /// Aggregates over the finalized processes and the metric history.
    pub fn results(&self) -> RunResults {
        let done: Vec<&Process> = self
            .finalized
            .iter()
            .filter_map(|&pid| self.procs.get(pid))
            .collect();
        let n = done.len();
        let average = |total: u64| (n > 0).then(|| total as f64 / n as f64);

        let memory = match &self.memory {
            MemoryUnit::Contiguous(a) => MemorySummary::Contiguous {
                average_fragmentation: self.history.average_fragmentation().unwrap_or(0.0),
                final_free: a.free_total(),
                largest_gap: a.largest_gap(),
            },
            MemoryUnit::Paged(a) => MemorySummary::Paged {
                page_faults: a.faults(),
            },
        };

        RunResults {
            completed: n,
            total: self.procs.len(),
            ticks: self.now,
            average_wait: average(done.iter().map(|p| p.wait).sum()),
            average_turnaround: average(done.iter().filter_map(|p| p.turnaround()).sum()),
            average_usage: self.history.average_usage(),
            dispatches: self.scheduler.dispatches(),
            preemptions: self.scheduler.preemptions(),
            io_grants: self.resource.grants(),
            io_denials: self.resource.denials(),
            memory,
        }
    }
}

/// Rejects explicit workloads the tick loop cannot address or admit.
fn check_workload(config: &Config, procs: &[Process]) -> Result<(), ConfigError> {
    for (index, p) in procs.iter().enumerate() {
        if p.pid.val() as usize != index + 1 {
            return Err(ConfigError::PidOutOfOrder {
                index,
                pid: p.pid.val(),
            });
        }
        if config.memory.mode == MemoryMode::Paged {
            let expected = p.demand.div_ceil(config.memory.page_size).max(1);
            if p.page_table.len() != expected {
                return Err(ConfigError::PageTableSize {
                    pid: p.pid.val(),
                    expected,
                    actual: p.page_table.len(),
                });
            }
        }
    }
    Ok(())
}
