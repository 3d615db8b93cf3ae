//! # Paged Allocator Tests
//!
//! Frame geometry, lowest-free-first binding, FIFO eviction order, fault counting, partial
//! admission with and without rollback, and randomized frame conservation.

use ossim_core::config::EvictionPolicy;
use ossim_core::mem::{FrameOwner, PagedAllocator};
use ossim_core::process::ProcessTable;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{assert_frame_invariants, paged_proc, pid, table};

fn owner(n: u32, page: usize) -> Option<FrameOwner> {
    Some(FrameOwner { pid: pid(n), page })
}

fn bound(procs: &ProcessTable, n: u32) -> usize {
    procs.get(pid(n)).map_or(0, |p| p.page_table().bound())
}

// ══════════════════════════════════════════════════════════
// 1. Geometry
// ══════════════════════════════════════════════════════════

#[test]
fn test_frame_count() {
    assert_eq!(PagedAllocator::new(100, 50, EvictionPolicy::None).frame_count(), 2);
    assert_eq!(PagedAllocator::new(130, 50, EvictionPolicy::None).frame_count(), 2);
    assert_eq!(PagedAllocator::new(1024, 64, EvictionPolicy::None).frame_count(), 16);
}

#[test]
fn test_frame_count_at_least_one() {
    assert_eq!(PagedAllocator::new(30, 50, EvictionPolicy::None).frame_count(), 1);
}

#[test]
fn test_pages_for() {
    let alloc = PagedAllocator::new(1024, 64, EvictionPolicy::None);
    assert_eq!(alloc.pages_for(1), 1);
    assert_eq!(alloc.pages_for(64), 1);
    assert_eq!(alloc.pages_for(65), 2);
    assert_eq!(alloc.pages_for(0), 1);
}

// ══════════════════════════════════════════════════════════
// 2. Binding without eviction
// ══════════════════════════════════════════════════════════

#[test]
fn test_binds_lowest_free_frames_in_page_order() {
    let mut alloc = PagedAllocator::new(200, 50, EvictionPolicy::None);
    let mut procs = table(vec![paged_proc(1, 3)]);

    assert!(alloc.allocate(pid(1), &mut procs));
    let process = procs.get(pid(1)).unwrap();
    assert_eq!(process.page_table().frames(), &[Some(0), Some(1), Some(2)]);
    assert_eq!(alloc.frames()[1], owner(1, 1));
    assert_eq!(alloc.faults(), 3);
    assert_eq!(alloc.free_count(), 1);
    assert!((alloc.usage_ratio() - 0.75).abs() < 1e-12);
    assert_frame_invariants(&alloc);
}

#[test]
fn test_no_free_frame_fails_without_eviction() {
    let mut alloc = PagedAllocator::new(100, 50, EvictionPolicy::None);
    let mut procs = table(vec![paged_proc(1, 2), paged_proc(2, 2)]);

    assert!(alloc.allocate(pid(1), &mut procs));
    assert_eq!(alloc.faults(), 2);

    assert!(!alloc.allocate(pid(2), &mut procs));
    assert_eq!(alloc.faults(), 2);
    assert_eq!(bound(&procs, 2), 0);
    assert_eq!(bound(&procs, 1), 2);
}

#[test]
fn test_free_returns_frames_and_clears_table() {
    let mut alloc = PagedAllocator::new(150, 50, EvictionPolicy::Fifo);
    let mut procs = table(vec![paged_proc(1, 1), paged_proc(2, 2)]);
    assert!(alloc.allocate(pid(1), &mut procs));
    assert!(alloc.allocate(pid(2), &mut procs));
    assert_eq!(alloc.load_order().collect::<Vec<_>>(), vec![0, 1, 2]);

    alloc.free(pid(2), &mut procs);
    assert_eq!(bound(&procs, 2), 0);
    assert_eq!(alloc.free_count(), 2);
    assert_eq!(alloc.load_order().collect::<Vec<_>>(), vec![0]);
    assert_eq!(alloc.faults(), 3);
    assert_frame_invariants(&alloc);
}

#[test]
fn test_reallocation_reuses_lowest_freed_frame() {
    let mut alloc = PagedAllocator::new(150, 50, EvictionPolicy::None);
    let mut procs = table(vec![paged_proc(1, 1), paged_proc(2, 1), paged_proc(3, 1)]);
    assert!(alloc.allocate(pid(1), &mut procs));
    assert!(alloc.allocate(pid(2), &mut procs));
    assert!(alloc.allocate(pid(3), &mut procs));

    alloc.free(pid(2), &mut procs);
    alloc.free(pid(1), &mut procs);
    assert!(alloc.allocate(pid(2), &mut procs));
    assert_eq!(procs.get(pid(2)).unwrap().page_table().frame(0), Some(0));
}

// ══════════════════════════════════════════════════════════
// 3. FIFO eviction
// ══════════════════════════════════════════════════════════

#[test]
fn test_fifo_evicts_in_load_order_and_counts_faults() {
    let mut alloc = PagedAllocator::new(100, 50, EvictionPolicy::Fifo);
    let mut procs = table(vec![paged_proc(1, 2), paged_proc(2, 2)]);

    assert!(alloc.allocate(pid(1), &mut procs));
    assert_eq!(alloc.faults(), 2);

    assert!(alloc.allocate(pid(2), &mut procs));
    assert_eq!(alloc.faults(), 4);
    assert_eq!(alloc.frames(), &[owner(2, 0), owner(2, 1)]);
    assert_eq!(bound(&procs, 1), 0);
    assert_eq!(
        procs.get(pid(2)).unwrap().page_table().frames(),
        &[Some(0), Some(1)]
    );
    assert_frame_invariants(&alloc);
}

#[test]
fn test_fifo_victim_is_oldest_loaded() {
    let mut alloc = PagedAllocator::new(100, 50, EvictionPolicy::Fifo);
    let mut procs = table(vec![
        paged_proc(1, 1),
        paged_proc(2, 1),
        paged_proc(3, 1),
        paged_proc(4, 1),
    ]);
    assert!(alloc.allocate(pid(1), &mut procs));
    assert!(alloc.allocate(pid(2), &mut procs));

    assert!(alloc.allocate(pid(3), &mut procs));
    assert_eq!(alloc.frames()[0], owner(3, 0));
    assert_eq!(bound(&procs, 1), 0);
    assert_eq!(alloc.load_order().collect::<Vec<_>>(), vec![1, 0]);

    assert!(alloc.allocate(pid(4), &mut procs));
    assert_eq!(alloc.frames()[1], owner(4, 0));
    assert_eq!(bound(&procs, 2), 0);
    assert_eq!(bound(&procs, 3), 1);
    assert_eq!(alloc.faults(), 4);
}

#[test]
fn test_fifo_self_eviction_admits_with_partial_table() {
    let mut alloc = PagedAllocator::new(100, 50, EvictionPolicy::Fifo);
    let mut procs = table(vec![paged_proc(1, 3)]);

    // Page 2 evicts page 0 of the same process.
    assert!(alloc.allocate(pid(1), &mut procs));
    assert_eq!(
        procs.get(pid(1)).unwrap().page_table().frames(),
        &[None, Some(1), Some(0)]
    );
    assert_eq!(alloc.faults(), 3);
    assert_eq!(alloc.frames(), &[owner(1, 2), owner(1, 1)]);
    assert_eq!(alloc.load_order().collect::<Vec<_>>(), vec![1, 0]);
    assert_frame_invariants(&alloc);
}

#[test]
fn test_freed_frame_preferred_over_eviction() {
    let mut alloc = PagedAllocator::new(100, 50, EvictionPolicy::Fifo);
    let mut procs = table(vec![paged_proc(1, 1), paged_proc(2, 1), paged_proc(3, 1)]);
    assert!(alloc.allocate(pid(1), &mut procs));
    assert!(alloc.allocate(pid(2), &mut procs));
    alloc.free(pid(2), &mut procs);

    assert!(alloc.allocate(pid(3), &mut procs));
    assert_eq!(alloc.frames(), &[owner(1, 0), owner(3, 0)]);
    assert_eq!(bound(&procs, 1), 1);
}

// ══════════════════════════════════════════════════════════
// 4. Partial admission
// ══════════════════════════════════════════════════════════

#[test]
fn test_partial_allocation_keeps_bound_frames() {
    let mut alloc = PagedAllocator::new(150, 50, EvictionPolicy::None);
    let mut procs = table(vec![paged_proc(1, 2), paged_proc(2, 2)]);
    assert!(alloc.allocate(pid(1), &mut procs));

    assert!(!alloc.allocate(pid(2), &mut procs));
    assert_eq!(
        procs.get(pid(2)).unwrap().page_table().frames(),
        &[Some(2), None]
    );
    assert_eq!(alloc.faults(), 3);
    assert_eq!(alloc.free_count(), 0);

    // A retry only needs the missing page.
    alloc.free(pid(1), &mut procs);
    assert!(alloc.allocate(pid(2), &mut procs));
    assert_eq!(
        procs.get(pid(2)).unwrap().page_table().frames(),
        &[Some(2), Some(0)]
    );
    assert_eq!(alloc.faults(), 4);
    assert_frame_invariants(&alloc);
}

#[test]
fn test_partial_allocation_rolls_back_when_enabled() {
    let mut alloc = PagedAllocator::new(150, 50, EvictionPolicy::None).with_rollback(true);
    let mut procs = table(vec![paged_proc(1, 2), paged_proc(2, 2)]);
    assert!(alloc.allocate(pid(1), &mut procs));

    assert!(!alloc.allocate(pid(2), &mut procs));
    assert_eq!(bound(&procs, 2), 0);
    assert_eq!(alloc.free_count(), 1);
    assert_eq!(alloc.frames()[2], None);
    assert_eq!(alloc.faults(), 2);

    // Repeated failures bind nothing and count nothing.
    for _ in 0..5 {
        assert!(!alloc.allocate(pid(2), &mut procs));
    }
    assert_eq!(alloc.faults(), 2);
    assert_eq!(alloc.occupied(), 2);

    alloc.free(pid(1), &mut procs);
    assert!(alloc.allocate(pid(2), &mut procs));
    assert_eq!(
        procs.get(pid(2)).unwrap().page_table().frames(),
        &[Some(0), Some(1)]
    );
    assert_eq!(alloc.faults(), 4);
    assert_frame_invariants(&alloc);
}

// ══════════════════════════════════════════════════════════
// 5. Randomized conservation
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_frame_table_invariants(
        frames in 1usize..8,
        fifo in any::<bool>(),
        rollback in any::<bool>(),
        pages in prop::collection::vec(1usize..5, 6),
        ops in prop::collection::vec((0usize..6, any::<bool>()), 1..64),
    ) {
        let eviction = if fifo { EvictionPolicy::Fifo } else { EvictionPolicy::None };
        let mut alloc = PagedAllocator::new(frames * 10, 10, eviction).with_rollback(rollback);
        let mut procs = table(
            pages
                .iter()
                .enumerate()
                .map(|(i, &n)| paged_proc(i as u32 + 1, n))
                .collect(),
        );

        let mut faults = 0;
        for (i, allocate) in ops {
            let p = pid(i as u32 + 1);
            if allocate {
                let _ = alloc.allocate(p, &mut procs);
            } else {
                alloc.free(p, &mut procs);
            }
            assert_frame_invariants(&alloc);
            prop_assert!(alloc.faults() >= faults);
            faults = alloc.faults();

            // Every mapped frame is reflected in its owner's page table.
            for (frame, slot) in alloc.frames().iter().enumerate() {
                if let Some(o) = slot {
                    let process = procs.get(o.pid).unwrap();
                    prop_assert_eq!(process.page_table().frame(o.page), Some(frame));
                }
            }
        }
    }
}
