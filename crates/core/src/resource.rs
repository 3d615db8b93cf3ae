//! Single exclusive peripheral.
//!
//! Modeled as a binary semaphore with a recorded holder. Acquisition never blocks and never
//! queues: a denied requester simply tries again on a later tick.

use crate::common::Pid;

/// Capacity-1 try-acquire/release gate.
///
/// Invariant: `available` is 0 or 1, and is 0 exactly when a holder is recorded.
#[derive(Debug, Clone)]
pub struct SharedResource {
    available: u8,
    holder: Option<Pid>,
    grants: u64,
    denials: u64,
}

impl Default for SharedResource {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedResource {
    /// Creates an unheld resource.
    pub const fn new() -> Self {
        Self {
            available: 1,
            holder: None,
            grants: 0,
            denials: 0,
        }
    }

    /// Takes the resource for `pid` if nobody holds it.
    ///
    /// Returns false, leaving the current holder in place, when it is already held.
    pub fn try_acquire(&mut self, pid: Pid) -> bool {
        if self.available == 0 {
            self.denials += 1;
            return false;
        }
        self.available = 0;
        self.holder = Some(pid);
        self.grants += 1;
        true
    }

    /// Frees the resource. No ownership check is made.
    pub fn release(&mut self) {
        self.available = 1;
        self.holder = None;
    }

    /// Current holder.
    pub fn holder(&self) -> Option<Pid> {
        self.holder
    }

    /// True when nobody holds the resource.
    pub fn is_available(&self) -> bool {
        self.available == 1
    }

    /// Successful acquisitions so far.
    pub fn grants(&self) -> u64 {
        self.grants
    }

    /// Denied acquisitions so far.
    pub fn denials(&self) -> u64 {
        self.denials
    }
}
