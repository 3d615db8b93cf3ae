//! Common types used throughout the simulator.
//!
//! 1. **Identifiers:** Process ids and the tick type.
//! 2. **Error Handling:** Configuration and construction errors.

/// Error types for configuration and simulator construction.
pub mod error;

/// Process identifier and simulated time types.
pub mod ids;

pub use error::{ConfigError, SimError};
pub use ids::{Pid, Tick};
