//! Paged memory allocator.
//!
//! Physical memory is split into `max(1, total / page_size)` frames. Each process page is bound
//! lazily to a frame on admission. The allocator keeps:
//! - a frame table of optional `(owner, page)` entries,
//! - a free-frame set (lowest index handed out first),
//! - a FIFO queue of mapped frames in load order, used for eviction.
//!
//! A frame index is either free or mapped, never both, and the FIFO queue holds exactly the
//! mapped indices. Every binding counts as a page fault, whether the frame was free or evicted.
//!
//! # Partial admission
//!
//! Admission walks the pages in order. When it runs out of frames partway through, the pages
//! bound so far stay bound and the process is reported as not admitted; a later retry only
//! needs the remaining pages. With `rollback_partial` enabled admission is all-or-nothing: a
//! call that cannot bind every missing page binds none of them and counts no faults.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::common::Pid;
use crate::config::EvictionPolicy;
use crate::process::{PageTable, ProcessTable};

/// Owner of a mapped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameOwner {
    /// Process holding the frame.
    pub pid: Pid,
    /// Page of that process stored in the frame.
    pub page: usize,
}

/// Frame-table allocator with optional FIFO eviction.
#[derive(Debug, Clone)]
pub struct PagedAllocator {
    page_size: usize,
    frames: Vec<Option<FrameOwner>>,
    free: BTreeSet<usize>,
    /// Mapped frames, oldest load first.
    fifo: VecDeque<usize>,
    eviction: EvictionPolicy,
    rollback_partial: bool,
    faults: u64,
}

impl PagedAllocator {
    /// Creates an allocator with every frame free.
    pub fn new(total: usize, page_size: usize, eviction: EvictionPolicy) -> Self {
        let count = total.checked_div(page_size).unwrap_or(0).max(1);
        Self {
            page_size,
            frames: vec![None; count],
            free: (0..count).collect(),
            fifo: VecDeque::with_capacity(count),
            eviction,
            rollback_partial: false,
            faults: 0,
        }
    }

    /// Enables or disables rollback of partially admitted processes.
    #[must_use]
    pub fn with_rollback(mut self, rollback_partial: bool) -> Self {
        self.rollback_partial = rollback_partial;
        self
    }

    /// Number of pages needed to hold `demand` units (at least one).
    pub fn pages_for(&self, demand: usize) -> usize {
        demand.div_ceil(self.page_size.max(1)).max(1)
    }

    /// Picks a frame for a new binding: lowest free frame, else the FIFO victim.
    ///
    /// An evicted victim's page table entry is cleared, unless the victim is the requester
    /// itself, in which case the entry is cleared in `own` (the requester's detached table).
    fn take_frame(
        &mut self,
        requester: Pid,
        own: &mut PageTable,
        procs: &mut ProcessTable,
    ) -> Option<usize> {
        if let Some(frame) = self.free.pop_first() {
            return Some(frame);
        }
        if self.eviction != EvictionPolicy::Fifo {
            return None;
        }
        let victim = self.fifo.pop_front()?;
        if let Some(owner) = self.frames[victim].take() {
            debug!(
                frame = victim,
                owner = %owner.pid,
                page = owner.page,
                for_pid = %requester,
                "evicting frame"
            );
            if owner.pid == requester {
                own.unbind(owner.page);
            } else if let Some(p) = procs.get_mut(owner.pid) {
                p.page_table.unbind(owner.page);
            }
        }
        Some(victim)
    }

    /// Binds a frame to every unbound page of `pid`, in page order.
    ///
    /// Returns true when every page is bound. See the module docs for the behavior when frames
    /// run out partway.
    pub fn allocate(&mut self, pid: Pid, procs: &mut ProcessTable) -> bool {
        let Some(process) = procs.get_mut(pid) else {
            return false;
        };
        // Eviction always yields a frame, so only free frames can run short.
        if self.rollback_partial
            && self.eviction != EvictionPolicy::Fifo
            && process.page_table.len() - process.page_table.bound() > self.free.len()
        {
            return false;
        }
        let mut table = std::mem::take(&mut process.page_table);
        let mut complete = true;

        for page in 0..table.len() {
            if table.frame(page).is_some() {
                continue;
            }
            let Some(frame) = self.take_frame(pid, &mut table, procs) else {
                complete = false;
                break;
            };
            self.frames[frame] = Some(FrameOwner { pid, page });
            self.fifo.push_back(frame);
            table.bind(page, frame);
            self.faults += 1;
        }

        if let Some(process) = procs.get_mut(pid) {
            process.page_table = table;
        }
        complete
    }

    fn release_frame(&mut self, frame: usize) {
        self.frames[frame] = None;
        let _ = self.free.insert(frame);
        self.fifo.retain(|&f| f != frame);
    }

    /// Releases every frame held by `pid` and clears its page table.
    pub fn free(&mut self, pid: Pid, procs: &mut ProcessTable) {
        let Some(process) = procs.get_mut(pid) else {
            return;
        };
        for (page, frame) in process.page_table.frames().iter().enumerate() {
            let Some(frame) = *frame else { continue };
            if self.frames.get(frame).copied().flatten() == Some(FrameOwner { pid, page }) {
                self.release_frame(frame);
            }
        }
        process.page_table.clear();
    }

    /// Page and frame size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of mapped frames.
    pub fn occupied(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// Number of free frames.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Owner of every frame, by frame index.
    pub fn frames(&self) -> &[Option<FrameOwner>] {
        &self.frames
    }

    /// Mapped frames in load order (eviction order under FIFO).
    pub fn load_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.fifo.iter().copied()
    }

    /// Replacement policy in use.
    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Page faults since the allocator was created.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    /// Occupied frames over total frames.
    pub fn usage_ratio(&self) -> f64 {
        self.occupied() as f64 / self.frames.len() as f64
    }
}
