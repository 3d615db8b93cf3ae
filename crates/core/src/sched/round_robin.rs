//! Round-robin scheduler.
//!
//! Processes are dispatched from the head of a FIFO ready queue and run until they finish,
//! block for I/O, or use up `quantum` consecutive ticks. Queues hold pids; the process records
//! live in the simulator's [`ProcessTable`].
//!
//! Within one simulation step, `preempt_if_due` must run before `dispatch` so that an expired
//! process is requeued and its successor dispatched in the same tick.

use std::collections::VecDeque;

use tracing::debug;

use crate::common::{Pid, Tick};
use crate::process::{Process, ProcessState, ProcessTable};

/// Preemptive round-robin scheduler with a fixed quantum.
#[derive(Debug, Clone)]
pub struct RoundRobinScheduler {
    quantum: u64,
    /// Consecutive ticks the running process has held the CPU.
    elapsed: u64,
    ready: VecDeque<Pid>,
    blocked: VecDeque<Pid>,
    running: Option<Pid>,
    dispatches: u64,
    preemptions: u64,
}

impl RoundRobinScheduler {
    /// Creates an idle scheduler.
    pub fn new(quantum: u64) -> Self {
        Self {
            quantum,
            elapsed: 0,
            ready: VecDeque::new(),
            blocked: VecDeque::new(),
            running: None,
            dispatches: 0,
            preemptions: 0,
        }
    }

    /// Moves a newly admitted process to the tail of the ready queue.
    pub fn admit(&mut self, process: &mut Process) {
        if process.state == ProcessState::New {
            process.state = ProcessState::Ready;
        }
        self.ready.push_back(process.pid);
        debug!(pid = %process.pid, "admitted");
    }

    /// Blocks the running process for I/O and frees the CPU.
    pub fn block(&mut self, process: &mut Process) {
        process.state = ProcessState::Blocked;
        self.blocked.push_back(process.pid);
        if self.running == Some(process.pid) {
            self.running = None;
        }
        self.elapsed = 0;
        debug!(pid = %process.pid, "blocked on I/O");
    }

    /// Returns a blocked process to the tail of the ready queue.
    pub fn unblock(&mut self, process: &mut Process) {
        let pid = process.pid;
        self.blocked.retain(|&p| p != pid);
        process.state = ProcessState::Ready;
        self.ready.push_back(pid);
        debug!(%pid, "unblocked");
    }

    /// Requeues the running process once it has used its whole quantum.
    ///
    /// Returns the preempted pid.
    pub fn preempt_if_due(&mut self, procs: &mut ProcessTable) -> Option<Pid> {
        let pid = self.running?;
        if self.elapsed < self.quantum {
            return None;
        }
        if let Some(p) = procs.get_mut(pid) {
            p.state = ProcessState::Ready;
        }
        self.ready.push_back(pid);
        self.running = None;
        self.elapsed = 0;
        self.preemptions += 1;
        debug!(%pid, quantum = self.quantum, "preempted");
        Some(pid)
    }

    /// Gives the CPU to the head of the ready queue when it is idle.
    ///
    /// Returns the dispatched pid.
    pub fn dispatch(&mut self, procs: &mut ProcessTable) -> Option<Pid> {
        if self.running.is_some() {
            return None;
        }
        let pid = self.ready.pop_front()?;
        if let Some(p) = procs.get_mut(pid) {
            p.state = ProcessState::Running;
        }
        self.running = Some(pid);
        self.elapsed = 0;
        self.dispatches += 1;
        debug!(%pid, "dispatched");
        Some(pid)
    }

    /// Retires the running process after its last burst tick.
    pub fn terminate(&mut self, process: &mut Process, now: Tick) {
        process.state = ProcessState::Terminated;
        process.finish = Some(now);
        if self.running == Some(process.pid) {
            self.running = None;
        }
        self.elapsed = 0;
        debug!(pid = %process.pid, finish = now, "terminated");
    }

    /// End-of-tick bookkeeping: every ready process waits one more tick, and the running
    /// process accrues one tick of its quantum.
    pub fn tick_accounting(&mut self, procs: &mut ProcessTable) {
        for &pid in &self.ready {
            if let Some(p) = procs.get_mut(pid) {
                p.wait += 1;
            }
        }
        if self.running.is_some() {
            self.elapsed += 1;
        }
    }

    /// Configured quantum.
    pub fn quantum(&self) -> u64 {
        self.quantum
    }

    /// Ticks the running process has used of its quantum.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Process holding the CPU.
    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    /// Ready queue, head first.
    pub fn ready(&self) -> impl Iterator<Item = Pid> + '_ {
        self.ready.iter().copied()
    }

    /// Blocked queue, in blocking order.
    pub fn blocked(&self) -> impl Iterator<Item = Pid> + '_ {
        self.blocked.iter().copied()
    }

    /// True when nothing is running, ready or blocked.
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.ready.is_empty() && self.blocked.is_empty()
    }

    /// Number of dispatches so far.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Number of quantum expirations so far.
    pub fn preemptions(&self) -> u64 {
        self.preemptions
    }
}
