//! Collaborator interfaces.
//!
//! The coordinator never touches hardware or wakeup bookkeeping itself. A
//! board supplies these traits; host tests supply fakes. All of them are
//! called from the worker task and from `set_target` callers, so they must
//! be `Sync`.

use crate::depth::TargetDepth;

/// Monotonic count of wakeup events since boot.
pub trait WakeupAccounting: Sync {
    /// Read the current count.
    ///
    /// With `block` set the read waits until no wakeup event is being
    /// processed. `None` means the read was aborted (for example because a
    /// shutdown is in progress) and the attempt must not go on.
    fn read_count(&self, block: bool) -> Option<u32>;

    /// Save `count` as the comparison baseline. Returns `false` if events
    /// were registered since `count` was read; any event after a successful
    /// save aborts the next suspend transition.
    fn save_count(&self, count: u32) -> bool;

    /// Autosleep was switched on or off. Accounting may use this to charge
    /// wakeup-source time to autosleep.
    fn set_autosleep_enabled(&self, _enabled: bool) {}
}

/// Platform suspend primitives.
///
/// Both calls block until the system resumes or the transition is aborted.
/// Neither reports an error: any return means "resume happened".
pub trait SuspendExecutor: Sync {
    /// Suspend to a depth below [`TargetDepth::MAX_SUSPEND`].
    fn suspend(&self, depth: TargetDepth);

    /// Hibernate and return after restore or abort.
    fn hibernate(&self);
}

/// Handle to a registered wakeup-blocking source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeupToken(pub u16);

/// Wakeup-blocking tokens ("wakeup sources").
pub trait WakeupSources: Sync {
    /// Register a named source. `None` when no slot is left.
    fn register(&self, name: &'static str) -> Option<WakeupToken>;

    fn unregister(&self, token: WakeupToken);

    /// Mark the source active: suspend is blocked until [`relax`](Self::relax).
    fn stay_awake(&self, token: WakeupToken);

    fn relax(&self, token: WakeupToken);

    /// Dump the currently active sources for diagnostics.
    fn report_active(&self);
}

/// CPU minimum-frequency control.
pub trait CpuFrequency: Sync {
    /// Pin the CPU at its floor frequency.
    fn engage_floor(&self);

    /// Return frequency selection to the governor.
    fn release_floor(&self);

    /// External condition for [`PowerFloorMode::Conditional`](crate::PowerFloorMode::Conditional),
    /// e.g. "running on battery".
    fn floor_condition(&self) -> bool {
        false
    }
}

/// The set of collaborators one coordinator drives.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    pub accounting: &'a dyn WakeupAccounting,
    pub executor: &'a dyn SuspendExecutor,
    pub sources: &'a dyn WakeupSources,
    pub cpu: &'a dyn CpuFrequency,
}
