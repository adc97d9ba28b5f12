//! Suspend/resume phase flag.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Whether the device is inside the suspended window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Awake,
    Asleep,
}

impl Phase {
    /// Label reported by the `autosleep_phase` attribute.
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Awake => "on",
            Phase::Asleep => "mem",
        }
    }

    pub const fn is_asleep(self) -> bool {
        matches!(self, Phase::Asleep)
    }
}

/// Phase flag plus the sequence number of the attempt that set it.
///
/// The sequence lets the watchdog tell one long suspend call apart from
/// several short ones.
pub(crate) struct PhaseFlags {
    asleep: AtomicBool,
    attempt: AtomicU32,
}

impl PhaseFlags {
    pub(crate) const fn new() -> Self {
        Self {
            asleep: AtomicBool::new(false),
            attempt: AtomicU32::new(0),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.asleep.load(Ordering::Acquire) {
            Phase::Asleep
        } else {
            Phase::Awake
        }
    }

    /// Enter the suspended window; returns the new attempt number.
    pub(crate) fn enter(&self) -> u32 {
        let attempt = self.attempt.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        self.asleep.store(true, Ordering::Release);
        attempt
    }

    pub(crate) fn exit(&self) {
        self.asleep.store(false, Ordering::Release);
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_entry_starts_a_new_attempt() {
        let flags = PhaseFlags::new();
        assert_eq!(flags.phase(), Phase::Awake);

        assert_eq!(flags.enter(), 1);
        assert_eq!(flags.phase(), Phase::Asleep);
        flags.exit();
        assert_eq!(flags.enter(), 2);
        assert_eq!(flags.attempt(), 2);
        flags.exit();
        flags.exit();
        assert_eq!(flags.phase(), Phase::Awake);
    }
}
