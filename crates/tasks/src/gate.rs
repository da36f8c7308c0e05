//! Availability gating
//!
//! A gate answers one question before a task does any work: can the host run
//! background work right now? A closed gate defers the task; it never fails it.

use std::sync::atomic::{AtomicBool, Ordering};

/// Host availability check
///
/// Implementations must be synchronous, side-effect free and safe to call
/// before anything else in the process has initialized.
pub trait AvailabilityGate: Send + Sync {
    /// Check whether the host can currently run background work
    fn is_available(&self) -> bool;
}

impl<F> AvailabilityGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_available(&self) -> bool {
        self()
    }
}

/// Gate with a fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAvailability(bool);

impl StaticAvailability {
    /// A gate that is always open
    pub fn available() -> Self {
        Self(true)
    }

    /// A gate that is always closed
    pub fn unavailable() -> Self {
        Self(false)
    }
}

impl AvailabilityGate for StaticAvailability {
    fn is_available(&self) -> bool {
        self.0
    }
}

/// Gate the host flips as its capabilities come and go
///
/// # Example
///
/// ```
/// use venuewatch_tasks::{AvailabilityGate, SwitchableAvailability};
///
/// let gate = SwitchableAvailability::new(false);
/// assert!(!gate.is_available());
///
/// gate.set_available(true);
/// assert!(gate.is_available());
/// ```
#[derive(Debug, Default)]
pub struct SwitchableAvailability {
    available: AtomicBool,
}

impl SwitchableAvailability {
    /// Create a gate with an initial state
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
        }
    }

    /// Update the gate
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }
}

impl AvailabilityGate for SwitchableAvailability {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}
