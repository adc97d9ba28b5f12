//! Sleep depths the coordinator can target.
//!
//! Depths are ordered from shallowest to deepest. Every raw value at or above
//! [`TargetDepth::MAX_SUSPEND`] means hibernate, so the raw encoding stored in
//! the shared state is total.

/// Low-power state the coordinator keeps trying to reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TargetDepth {
    /// No suspend is attempted.
    Awake = 0,
    /// Suspend-to-idle: CPUs idle, devices quiesced.
    Idle = 1,
    /// Shallow platform standby.
    Standby = 2,
    /// Suspend-to-RAM.
    MemorySleep = 3,
    /// Save state and power off.
    Hibernate = 4,
}

impl TargetDepth {
    /// First raw value that no longer names a suspend depth.
    pub const MAX_SUSPEND: u8 = 4;

    /// All depths, shallowest first.
    pub const ALL: [TargetDepth; 5] = [
        TargetDepth::Awake,
        TargetDepth::Idle,
        TargetDepth::Standby,
        TargetDepth::MemorySleep,
        TargetDepth::Hibernate,
    ];

    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Decode a raw depth. Anything past the suspend range is hibernate.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => TargetDepth::Awake,
            1 => TargetDepth::Idle,
            2 => TargetDepth::Standby,
            3 => TargetDepth::MemorySleep,
            _ => TargetDepth::Hibernate,
        }
    }

    pub const fn is_awake(self) -> bool {
        matches!(self, TargetDepth::Awake)
    }

    /// True for depths handled by the hibernate primitive instead of suspend.
    pub const fn is_hibernate(self) -> bool {
        self.as_raw() >= Self::MAX_SUSPEND
    }

    /// Label used by the `autosleep` attribute.
    pub const fn label(self) -> &'static str {
        match self {
            TargetDepth::Awake => "off",
            TargetDepth::Idle => "freeze",
            TargetDepth::Standby => "standby",
            TargetDepth::MemorySleep => "mem",
            TargetDepth::Hibernate => "disk",
        }
    }

    /// Parse an attribute label. Trailing whitespace (a newline from `echo`)
    /// is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim_end();
        Self::ALL.into_iter().find(|depth| depth.label() == label)
    }
}
