//! Memory managers.
//!
//! Exactly one memory manager is active per run. This module provides:
//! 1. **Allocators:** [`ContiguousAllocator`] (gap list) and [`PagedAllocator`] (frame table).
//! 2. **Capability trait:** [`MemoryManager`], the mode-independent interface used by the
//!    simulator to admit and release processes and to sample metrics.
//! 3. **Dispatch:** [`MemoryUnit`], the tagged variant selected once from configuration.

/// Contiguous allocation with first/best/worst-fit placement and compaction.
pub mod contiguous;

/// Paged allocation with optional FIFO eviction.
pub mod paged;

use serde::Serialize;

pub use self::contiguous::{ContiguousAllocator, Gap, Segment};
pub use self::paged::{FrameOwner, PagedAllocator};
use crate::common::Pid;
use crate::config::{MemoryConfig, MemoryMode};
use crate::process::ProcessTable;

/// The mode-specific metric sampled alongside usage every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SecondaryMetric {
    /// Fragmentation degree of contiguous memory, in `[0, 1)`.
    Fragmentation(f64),
    /// Cumulative page faults of paged memory.
    PageFaults(u64),
}

impl SecondaryMetric {
    /// Human-readable metric name.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fragmentation(_) => "fragmentation",
            Self::PageFaults(_) => "page faults",
        }
    }

    /// Metric value as a float (for charting).
    pub fn value(&self) -> f64 {
        match *self {
            Self::Fragmentation(f) => f,
            Self::PageFaults(n) => n as f64,
        }
    }
}

/// Read-only layout of memory for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "layout", rename_all = "lowercase")]
pub enum MemoryView {
    /// Address-ordered segments covering the whole space.
    Contiguous(Vec<Segment>),
    /// Owner of every frame, by frame index.
    Paged(Vec<Option<FrameOwner>>),
}

/// Uniform interface over the active memory manager.
///
/// Allocation failures are recoverable: `allocate` returns false and the caller retries on a
/// later tick.
pub trait MemoryManager {
    /// Tries to give `pid` all the memory it demands; records the binding on the process.
    fn allocate(&mut self, pid: Pid, procs: &mut ProcessTable) -> bool;

    /// Returns everything `pid` holds and clears the binding on the process.
    fn free(&mut self, pid: Pid, procs: &mut ProcessTable);

    /// Fraction of memory in use, in `[0, 1]`.
    fn usage_ratio(&self) -> f64;

    /// Mode-specific metric.
    fn secondary_metric(&self) -> SecondaryMetric;

    /// Current layout.
    fn view(&self) -> MemoryView;
}

impl MemoryManager for ContiguousAllocator {
    fn allocate(&mut self, pid: Pid, procs: &mut ProcessTable) -> bool {
        let Some(process) = procs.get_mut(pid) else {
            return false;
        };
        match Self::allocate(self, pid, process.demand) {
            Some(region) => {
                process.region = Some(region);
                true
            }
            None => false,
        }
    }

    fn free(&mut self, pid: Pid, procs: &mut ProcessTable) {
        Self::free(self, pid);
        if let Some(process) = procs.get_mut(pid) {
            process.region = None;
        }
    }

    fn usage_ratio(&self) -> f64 {
        Self::usage_ratio(self)
    }

    fn secondary_metric(&self) -> SecondaryMetric {
        SecondaryMetric::Fragmentation(self.fragmentation())
    }

    fn view(&self) -> MemoryView {
        MemoryView::Contiguous(self.segments())
    }
}

impl MemoryManager for PagedAllocator {
    fn allocate(&mut self, pid: Pid, procs: &mut ProcessTable) -> bool {
        Self::allocate(self, pid, procs)
    }

    fn free(&mut self, pid: Pid, procs: &mut ProcessTable) {
        Self::free(self, pid, procs);
    }

    fn usage_ratio(&self) -> f64 {
        Self::usage_ratio(self)
    }

    fn secondary_metric(&self) -> SecondaryMetric {
        SecondaryMetric::PageFaults(self.faults())
    }

    fn view(&self) -> MemoryView {
        MemoryView::Paged(self.frames().to_vec())
    }
}

/// Enum wrapper for static dispatch over the active memory manager.
#[derive(Debug, Clone)]
pub enum MemoryUnit {
    /// Contiguous gap-list memory.
    Contiguous(ContiguousAllocator),
    /// Paged frame-table memory.
    Paged(PagedAllocator),
}

impl MemoryUnit {
    /// Builds the memory manager selected by `config.mode`.
    pub fn new(config: &MemoryConfig) -> Self {
        match config.mode {
            MemoryMode::Contiguous => {
                Self::Contiguous(ContiguousAllocator::new(config.total_size, config.placement))
            }
            MemoryMode::Paged => Self::Paged(
                PagedAllocator::new(config.total_size, config.page_size, config.eviction)
                    .with_rollback(config.rollback_partial),
            ),
        }
    }

    /// Compacts contiguous memory and moves every process binding to its new region.
    ///
    /// Returns false, doing nothing, in paged mode.
    pub fn compact(&mut self, procs: &mut ProcessTable) -> bool {
        let Self::Contiguous(alloc) = self else {
            return false;
        };
        alloc.compact();
        for process in procs.iter_mut() {
            if process.region.is_some() {
                process.region = alloc.allocation(process.pid);
            }
        }
        true
    }

    /// The contiguous allocator, when active.
    pub fn as_contiguous(&self) -> Option<&ContiguousAllocator> {
        match self {
            Self::Contiguous(a) => Some(a),
            Self::Paged(_) => None,
        }
    }

    /// The paged allocator, when active.
    pub fn as_paged(&self) -> Option<&PagedAllocator> {
        match self {
            Self::Paged(a) => Some(a),
            Self::Contiguous(_) => None,
        }
    }
}

impl MemoryManager for MemoryUnit {
    fn allocate(&mut self, pid: Pid, procs: &mut ProcessTable) -> bool {
        match self {
            Self::Contiguous(a) => MemoryManager::allocate(a, pid, procs),
            Self::Paged(a) => MemoryManager::allocate(a, pid, procs),
        }
    }

    fn free(&mut self, pid: Pid, procs: &mut ProcessTable) {
        match self {
            Self::Contiguous(a) => MemoryManager::free(a, pid, procs),
            Self::Paged(a) => MemoryManager::free(a, pid, procs),
        }
    }

    fn usage_ratio(&self) -> f64 {
        match self {
            Self::Contiguous(a) => MemoryManager::usage_ratio(a),
            Self::Paged(a) => MemoryManager::usage_ratio(a),
        }
    }

    fn secondary_metric(&self) -> SecondaryMetric {
        match self {
            Self::Contiguous(a) => a.secondary_metric(),
            Self::Paged(a) => a.secondary_metric(),
        }
    }

    fn view(&self) -> MemoryView {
        match self {
            Self::Contiguous(a) => a.view(),
            Self::Paged(a) => a.view(),
        }
    }
}
