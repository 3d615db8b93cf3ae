//! Simulated process entity.
//!
//! A [`Process`] describes one unit of synthetic workload together with its current resource
//! bindings. Processes are created once, in state `New`, and are never removed: a finished
//! process is kept in the [`ProcessTable`] and appended to the simulator's finalized list.
//!
//! Field ownership is split by concern. Scheduling state (`state`, `wait`, `finish`) is written
//! by the scheduler, memory bindings (`region`, `page_table`) by the active allocator, and the
//! burst and I/O fields by the simulator's execution step. Everything is readable through
//! accessors.

use serde::Serialize;

use crate::common::{Pid, Tick};

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// Created, not yet holding memory.
    #[default]
    New,
    /// Waiting in the ready queue.
    Ready,
    /// Holding the CPU.
    Running,
    /// Waiting for simulated I/O to finish.
    Blocked,
    /// Burst complete. Terminal.
    Terminated,
}

/// Per-process page table: one entry per page, each optionally bound to a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageTable {
    frames: Vec<Option<usize>>,
}

impl PageTable {
    /// Creates a table of `pages` unbound entries.
    pub fn new(pages: usize) -> Self {
        Self {
            frames: vec![None; pages],
        }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True for a process without pages (contiguous mode).
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame bound to `page`, if any.
    pub fn frame(&self, page: usize) -> Option<usize> {
        self.frames.get(page).copied().flatten()
    }

    /// Frame of every page, in page order.
    pub fn frames(&self) -> &[Option<usize>] {
        &self.frames
    }

    /// Number of pages currently bound to a frame.
    pub fn bound(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// True when every page has a frame.
    pub fn is_fully_bound(&self) -> bool {
        self.frames.iter().all(Option::is_some)
    }

    pub(crate) fn bind(&mut self, page: usize, frame: usize) {
        if let Some(slot) = self.frames.get_mut(page) {
            *slot = Some(frame);
        }
    }

    pub(crate) fn unbind(&mut self, page: usize) {
        if let Some(slot) = self.frames.get_mut(page) {
            *slot = None;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.frames.fill(None);
    }
}

/// One simulated workload unit.
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    pub(crate) pid: Pid,
    pub(crate) arrival: Tick,
    pub(crate) burst: u64,
    pub(crate) remaining: u64,
    pub(crate) demand: usize,
    pub(crate) state: ProcessState,
    pub(crate) wait: u64,
    pub(crate) finish: Option<Tick>,
    /// Contiguous binding: `(start, length)`.
    pub(crate) region: Option<(usize, usize)>,
    pub(crate) page_table: PageTable,
    /// Remaining-burst value at which the process requests the peripheral.
    pub(crate) io_trigger: Option<u64>,
    /// Ticks of I/O left while blocked.
    pub(crate) io_countdown: Option<u64>,
}

impl Process {
    /// Creates a `New` process with a full remaining burst and no bindings.
    pub fn new(pid: Pid, arrival: Tick, burst: u64, demand: usize) -> Self {
        Self {
            pid,
            arrival,
            burst,
            remaining: burst,
            demand,
            state: ProcessState::New,
            wait: 0,
            finish: None,
            region: None,
            page_table: PageTable::default(),
            io_trigger: None,
            io_countdown: None,
        }
    }

    /// Arms an I/O request at the given remaining-burst value.
    #[must_use]
    pub fn with_io_trigger(mut self, trigger: Option<u64>) -> Self {
        self.io_trigger = trigger;
        self
    }

    /// Sizes the page table to `pages` unbound entries.
    #[must_use]
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.page_table = PageTable::new(pages);
        self
    }

    /// Process identifier.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Tick at which the process enters the system.
    pub fn arrival(&self) -> Tick {
        self.arrival
    }

    /// Total CPU burst.
    pub fn burst(&self) -> u64 {
        self.burst
    }

    /// CPU ticks still to execute.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Memory demand in allocation units.
    pub fn demand(&self) -> usize {
        self.demand
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Ticks spent in the ready queue.
    pub fn wait(&self) -> u64 {
        self.wait
    }

    /// Tick of the final execution unit, once terminated.
    pub fn finish(&self) -> Option<Tick> {
        self.finish
    }

    /// Finish minus arrival, once terminated.
    pub fn turnaround(&self) -> Option<u64> {
        self.finish.map(|f| f.saturating_sub(self.arrival))
    }

    /// Contiguous binding `(start, length)`, while admitted in contiguous mode.
    pub fn region(&self) -> Option<(usize, usize)> {
        self.region
    }

    /// Page table (empty in contiguous mode).
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    /// Pending I/O trigger point.
    pub fn io_trigger(&self) -> Option<u64> {
        self.io_trigger
    }

    /// Remaining I/O ticks while blocked.
    pub fn io_countdown(&self) -> Option<u64> {
        self.io_countdown
    }

    /// True when the pending I/O request is due at the current remaining burst.
    ///
    /// A request stays due once reached, so a denied attempt is retried on the next execution
    /// tick.
    pub(crate) fn io_due(&self) -> bool {
        self.io_trigger.is_some_and(|t| self.remaining <= t)
    }

    /// Consumes the pending I/O request and starts the blocked countdown.
    pub(crate) fn start_io(&mut self, duration: u64) {
        self.io_trigger = None;
        self.io_countdown = Some(duration);
    }

    /// Advances the I/O countdown by one tick; returns true when it reaches zero.
    pub(crate) fn advance_io(&mut self) -> bool {
        match self.io_countdown {
            Some(n) if n <= 1 => {
                self.io_countdown = None;
                true
            }
            Some(n) => {
                self.io_countdown = Some(n - 1);
                false
            }
            None => false,
        }
    }

    /// Executes one CPU tick; returns true when the burst is complete.
    pub(crate) fn execute(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Pid-indexed storage for every process of a run.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    procs: Vec<Process>,
}

impl ProcessTable {
    /// Builds a table from processes numbered `Pid(1)..` in order.
    pub fn new(procs: Vec<Process>) -> Self {
        Self { procs }
    }

    /// Number of processes.
    pub fn len(&self) -> usize {
        self.procs.len()
    }

    /// True when the table holds no process.
    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Looks up a process.
    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.procs.get(pid.slot()).filter(|p| p.pid == pid)
    }

    /// Looks up a process for mutation.
    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.procs.get_mut(pid.slot()).filter(|p| p.pid == pid)
    }

    /// All processes in pid order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.procs.iter()
    }

    /// All processes in pid order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.procs.iter_mut()
    }
}
