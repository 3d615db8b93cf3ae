//! Identifier and time types.
//!
//! This module defines the strong types shared by every component of the simulator:
//! 1. **Process identity:** `Pid`, assigned once at workload synthesis and never reused.
//! 2. **Simulated time:** `Tick`, the discrete time unit advanced by `Simulator::step`.

use std::fmt;

use serde::Serialize;

/// Simulated time, in ticks since the start of the run.
pub type Tick = u64;

/// A process identifier.
///
/// Identifiers are dense and 1-based: the `n`-th synthesized process gets `Pid(n)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    /// Creates a new identifier from its raw value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[inline]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Position of this process in a pid-ordered table (`Pid(1)` is slot 0).
    #[inline]
    pub const fn slot(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}
