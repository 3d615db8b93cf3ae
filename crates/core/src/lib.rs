//! Operating-system resource simulator library.
//!
//! This crate implements a deterministic, tick-driven model of three classic OS resource
//! managers acting on a synthetic workload:
//! 1. **Memory:** Contiguous allocation (first/best/worst fit, merge on free, manual compaction)
//!    or paged allocation (fixed frames, optional FIFO eviction).
//! 2. **Scheduling:** Preemptive round robin with a fixed quantum.
//! 3. **Peripheral:** One mutually exclusive resource acquired without blocking or queueing.
//! 4. **Simulation:** Seeded workload synthesis, the per-tick orchestrator, snapshots and
//!    aggregate results.
//!
//! # Examples
//!
//! ```
//! use ossim_core::config::{Config, Preset};
//! use ossim_core::sim::{RunOutcome, Simulator};
//!
//! let mut sim = Simulator::new(Config::preset(Preset::ContiguousBestFit)).unwrap();
//! assert_eq!(sim.run(), RunOutcome::Completed);
//! let results = sim.results();
//! assert_eq!(results.completed, results.total);
//! ```

/// Common types (identifiers, ticks, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures, presets).
pub mod config;
/// Memory managers (contiguous, paged) behind a uniform interface.
pub mod mem;
/// Process entity and pid-indexed process table.
pub mod process;
/// The single shared peripheral.
pub mod resource;
/// CPU scheduling.
pub mod sched;
/// Simulation driver and workload synthesis.
pub mod sim;
/// Metric history, snapshots and final results.
pub mod stats;

/// Root configuration type; use `Config::default()`, a preset, or `Config::from_json`.
pub use crate::config::Config;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
