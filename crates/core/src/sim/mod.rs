//! Simulation driver and workload synthesis.

/// Tick-driven orchestrator.
pub mod simulator;
/// Seeded process generation.
pub mod workload;

pub use self::simulator::{RunOutcome, Simulator};
