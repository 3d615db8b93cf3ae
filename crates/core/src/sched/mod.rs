//! CPU scheduling.
//!
//! The scheduler owns the ready and blocked queues and the running slot. All process state
//! transitions (`New` → `Ready` → `Running` → `Blocked`/`Ready`/`Terminated`) go through it.

/// Preemptive round-robin scheduler.
pub mod round_robin;

pub use self::round_robin::RoundRobinScheduler;
