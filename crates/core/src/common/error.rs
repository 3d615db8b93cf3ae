//! Error definitions.
//!
//! Two classes of failure exist in the simulator:
//! 1. **Recoverable conditions** inside the tick loop (no contiguous space, no free or evictable
//!    frame, peripheral already held). These are reported as `Option`/`bool` results by the
//!    components and are never represented here.
//! 2. **Configuration errors**, detected before a run starts. They are fatal to the run and are
//!    described by [`ConfigError`]; [`SimError`] wraps them together with input-format failures.

use thiserror::Error;

/// A rejected configuration parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Total memory size must be at least one unit.
    #[error("total memory size must be greater than zero")]
    ZeroMemory,

    /// Page size must be at least one unit.
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    /// A page larger than the whole memory leaves no room for a frame.
    #[error("page size {page_size} exceeds total memory size {total}")]
    PageLargerThanMemory {
        /// Configured page size.
        page_size: usize,
        /// Configured total memory size.
        total: usize,
    },

    /// The round-robin quantum must be at least one tick.
    #[error("quantum must be at least one tick")]
    ZeroQuantum,

    /// The workload must contain at least one process.
    #[error("workload must contain at least one process")]
    EmptyWorkload,

    /// The tick budget used to spread arrivals must be positive.
    #[error("tick budget must be greater than zero")]
    ZeroTickBudget,

    /// Burst lengths are drawn from `min..=max`; the range must be non-empty and start at 1.
    #[error("invalid burst range {min}..={max}")]
    InvalidBurstRange {
        /// Lower bound of the burst range.
        min: u64,
        /// Upper bound of the burst range.
        max: u64,
    },

    /// Memory demand fractions must satisfy `0 < min <= max <= 1`.
    #[error("invalid demand fractions {min}..={max}")]
    InvalidDemandFractions {
        /// Lower demand fraction.
        min: f64,
        /// Upper demand fraction.
        max: f64,
    },

    /// Simulated I/O must take at least one tick.
    #[error("I/O duration must be at least one tick")]
    ZeroIoDuration,

    /// Explicit workloads must be numbered `Pid(1)`, `Pid(2)`, … in order.
    #[error("process at position {index} has pid {pid}, expected {}", index + 1)]
    PidOutOfOrder {
        /// Zero-based position in the workload.
        index: usize,
        /// Pid found at that position.
        pid: u32,
    },

    /// In paged mode a page table must have one entry per page of demand.
    #[error("process {pid} has {actual} page table entries, expected {expected}")]
    PageTableSize {
        /// Offending process.
        pid: u32,
        /// Entries needed for its demand.
        expected: usize,
        /// Entries present.
        actual: usize,
    },

    /// Unrecognized memory mode name.
    #[error("unknown memory mode `{0}` (expected `contiguous` or `paged`)")]
    UnknownMode(String),

    /// Unrecognized placement policy name.
    #[error("unknown placement policy `{0}` (expected `first`, `best` or `worst`)")]
    UnknownPlacement(String),

    /// Unrecognized eviction policy name.
    #[error("unknown eviction policy `{0}` (expected `none` or `fifo`)")]
    UnknownEviction(String),

    /// Unrecognized preset name.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}

/// Failure to construct a simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The configuration document could not be parsed.
    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
