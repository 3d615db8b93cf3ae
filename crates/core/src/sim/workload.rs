//! Synthetic workload generation.
//!
//! Every process attribute is drawn from a caller-supplied generator, so a seeded generator
//! reproduces the same workload:
//! - arrival uniform in `0..=max(1, tick_budget / 4)`,
//! - burst uniform in `burst_min..=burst_max`,
//! - demand uniform between the configured fractions of total memory (at least 1 unit),
//! - I/O trigger chosen uniformly among none, `burst / 2` and `burst / 3`.

use rand::Rng;

use crate::common::Pid;
use crate::config::{Config, MemoryMode};
use crate::process::Process;

/// Inclusive demand bounds in allocation units.
fn demand_bounds(config: &Config) -> (usize, usize) {
    let total = config.memory.total_size as f64;
    let lo = ((config.general.demand_min_fraction * total) as usize).max(1);
    let hi = ((config.general.demand_max_fraction * total) as usize).max(lo);
    (lo, hi)
}

/// Draws `config.general.workload_size` processes, numbered from `Pid(1)`.
///
/// In paged mode each page table is pre-sized to `max(1, ceil(demand / page_size))` unbound
/// entries.
pub fn synthesize<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Vec<Process> {
    let general = &config.general;
    let max_arrival = (general.tick_budget / 4).max(1);
    let (demand_lo, demand_hi) = demand_bounds(config);
    let page_size = config.memory.page_size.max(1);

    (1..=general.workload_size)
        .map(|n| {
            let arrival = rng.random_range(0..=max_arrival);
            let burst = rng.random_range(general.burst_min..=general.burst_max);
            let demand = rng.random_range(demand_lo..=demand_hi);
            let io_trigger = match rng.random_range(0..3u8) {
                0 => None,
                1 => Some(burst / 2),
                _ => Some(burst / 3),
            };

            let process = Process::new(Pid::new(n as u32), arrival, burst, demand)
                .with_io_trigger(io_trigger);
            match config.memory.mode {
                MemoryMode::Paged => process.with_pages(demand.div_ceil(page_size).max(1)),
                MemoryMode::Contiguous => process,
            }
        })
        .collect()
}
