//! Contiguous memory allocator.
//!
//! Manages one linear address space `[0, total)` as a sorted list of free gaps plus a map of
//! active allocations keyed by pid. It provides:
//! 1. **Placement:** First-fit, best-fit and worst-fit search among sufficient gaps.
//! 2. **Release:** Return of a region with merging of address-adjacent gaps.
//! 3. **Compaction:** Explicit relocation of every allocation to the lowest addresses.
//! 4. **Metrics:** Usage ratio and fragmentation degree.
//!
//! Invariant: the sum of gap lengths plus the sum of allocation lengths equals `total`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::common::Pid;
use crate::config::PlacementPolicy;

/// A maximal free region of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gap {
    /// First free address.
    pub start: usize,
    /// Number of free units.
    pub len: usize,
}

impl Gap {
    /// Creates a gap.
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last free address.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// One piece of the address space, as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// Region held by a process.
    Allocated {
        /// Owner.
        pid: Pid,
        /// First address.
        start: usize,
        /// Length.
        len: usize,
    },
    /// Free region.
    Free {
        /// First address.
        start: usize,
        /// Length.
        len: usize,
    },
}

/// Gap-list allocator over a single linear address space.
#[derive(Debug, Clone)]
pub struct ContiguousAllocator {
    total: usize,
    policy: PlacementPolicy,
    /// Sorted by start address.
    gaps: Vec<Gap>,
    allocations: BTreeMap<Pid, (usize, usize)>,
}

impl ContiguousAllocator {
    /// Creates an allocator whose whole space is one free gap.
    pub fn new(total: usize, policy: PlacementPolicy) -> Self {
        let gaps = if total > 0 {
            vec![Gap::new(0, total)]
        } else {
            Vec::new()
        };
        Self {
            total,
            policy,
            gaps,
            allocations: BTreeMap::new(),
        }
    }

    /// Builds an allocator from an explicit layout.
    ///
    /// Used to set up placement scenarios. The caller must pass non-overlapping regions that
    /// together with `allocations` tile `[0, total)`.
    pub fn with_layout(
        total: usize,
        policy: PlacementPolicy,
        mut gaps: Vec<Gap>,
        allocations: impl IntoIterator<Item = (Pid, usize, usize)>,
    ) -> Self {
        gaps.sort_by_key(|g| g.start);
        Self {
            total,
            policy,
            gaps,
            allocations: allocations
                .into_iter()
                .map(|(pid, start, len)| (pid, (start, len)))
                .collect(),
        }
    }

    /// Index in `gaps` of the gap chosen by the placement policy.
    fn find_gap(&self, size: usize) -> Option<usize> {
        let mut candidates = self
            .gaps
            .iter()
            .enumerate()
            .filter(|(_, g)| g.len >= size);

        match self.policy {
            PlacementPolicy::FirstFit => candidates.next().map(|(i, _)| i),
            // Gaps are sorted by start, so the first minimum/maximum is the lowest address.
            PlacementPolicy::BestFit => candidates
                .min_by(|(ia, a), (ib, b)| a.len.cmp(&b.len).then(ia.cmp(ib)))
                .map(|(i, _)| i),
            PlacementPolicy::WorstFit => candidates
                .max_by(|(ia, a), (ib, b)| a.len.cmp(&b.len).then(ib.cmp(ia)))
                .map(|(i, _)| i),
        }
    }

    /// Allocates `size` units for `pid`.
    ///
    /// Returns `(start, size)` on success, or `None` when no gap is large enough or `pid`
    /// already holds a region. The chosen gap is shrunk from its low end, and removed when it
    /// becomes empty.
    pub fn allocate(&mut self, pid: Pid, size: usize) -> Option<(usize, usize)> {
        if self.allocations.contains_key(&pid) {
            return None;
        }
        let idx = self.find_gap(size)?;
        let gap = &mut self.gaps[idx];
        let start = gap.start;
        gap.start += size;
        gap.len -= size;
        if gap.len == 0 {
            let _ = self.gaps.remove(idx);
        }
        let _ = self.allocations.insert(pid, (start, size));
        Some((start, size))
    }

    /// Releases the allocation of `pid`, merging the region with adjacent gaps.
    ///
    /// No-op when `pid` holds nothing.
    pub fn free(&mut self, pid: Pid) {
        let Some((start, len)) = self.allocations.remove(&pid) else {
            return;
        };
        if len == 0 {
            return;
        }
        let pos = self.gaps.partition_point(|g| g.start < start);
        self.gaps.insert(pos, Gap::new(start, len));

        let mut merged: Vec<Gap> = Vec::with_capacity(self.gaps.len());
        for gap in self.gaps.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end() == gap.start => last.len += gap.len,
                _ => merged.push(gap),
            }
        }
        self.gaps = merged;
    }

    /// Slides every allocation down to the lowest addresses, keeping their order.
    ///
    /// Leaves a single trailing gap holding all free space (or no gap when memory is full).
    pub fn compact(&mut self) {
        let mut order: Vec<(Pid, usize, usize)> = self
            .allocations
            .iter()
            .map(|(&pid, &(start, len))| (pid, start, len))
            .collect();
        order.sort_by_key(|&(_, start, _)| start);

        let mut cursor = 0;
        for (pid, _, len) in order {
            let _ = self.allocations.insert(pid, (cursor, len));
            cursor += len;
        }

        self.gaps.clear();
        if cursor < self.total {
            self.gaps.push(Gap::new(cursor, self.total - cursor));
        }
        debug!(
            allocated = cursor,
            free = self.total - cursor,
            "compacted contiguous memory"
        );
    }

    /// Total address space size.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Placement policy in use.
    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Free gaps, sorted by start address.
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Region held by `pid`.
    pub fn allocation(&self, pid: Pid) -> Option<(usize, usize)> {
        self.allocations.get(&pid).copied()
    }

    /// Number of active allocations.
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Units currently allocated.
    pub fn allocated(&self) -> usize {
        self.allocations.values().map(|&(_, len)| len).sum()
    }

    /// Units currently free.
    pub fn free_total(&self) -> usize {
        self.gaps.iter().map(|g| g.len).sum()
    }

    /// Length of the largest gap, 0 when memory is full.
    pub fn largest_gap(&self) -> usize {
        self.gaps.iter().map(|g| g.len).max().unwrap_or(0)
    }

    /// Allocated units over total size.
    pub fn usage_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.allocated() as f64 / self.total as f64
    }

    /// `1 - largest_gap / free_total`, or 0 when nothing is free.
    pub fn fragmentation(&self) -> f64 {
        let free = self.free_total();
        if free == 0 {
            return 0.0;
        }
        1.0 - self.largest_gap() as f64 / free as f64
    }

    /// The whole address space as ordered allocated and free segments.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .allocations
            .iter()
            .map(|(&pid, &(start, len))| Segment::Allocated { pid, start, len })
            .chain(self.gaps.iter().map(|g| Segment::Free {
                start: g.start,
                len: g.len,
            }))
            .collect();
        segments.sort_by_key(|s| match *s {
            Segment::Allocated { start, .. } | Segment::Free { start, .. } => start,
        });
        segments
    }
}
