//! Optional hooks for board and vendor code.
//!
//! Timestamp logging on target changes, "power suspend" notifications and
//! vendor cleanup on autosleep entry hang off these callbacks instead of
//! living inside the attempt state machine.

use crate::depth::TargetDepth;
use crate::worker::AttemptOutcome;

/// Receives autosleep events. All methods default to doing nothing.
pub trait AutosleepObserver: Sync {
    /// The target depth was changed by `set_target`. Called with the state
    /// lock held; must not call back into the coordinator.
    fn target_changed(&self, _from: TargetDepth, _to: TargetDepth) {}

    /// A worker cycle finished.
    fn attempt_finished(&self, _outcome: &AttemptOutcome) {}
}
