//! Crate-wide constants and runtime configuration.
//!
//! All timing parameters and limits live here so they can be tuned in one
//! place. [`Config`] carries the runtime copy so tests and boards can
//! override individual values.

use embassy_time::Duration;

use crate::floor::PowerFloorMode;

// Suspend attempts

/// Pause after a resume with no attributable wakeup (ms), so an unknown
/// wakeup reason can't drive a tight suspend/resume loop.
pub const SUSPEND_COOLDOWN_MS: u64 = 500;

/// Name of the wakeup-blocking token held while the target is changed.
pub const AUTOSLEEP_WAKEUP_SOURCE: &str = "autosleep";

/// Whether the hibernate depth ("disk") may be targeted.
pub const HIBERNATION_SUPPORTED: bool = cfg!(feature = "hibernation");

// Watchdog

/// Interval between stuck-suspend checks (seconds).
pub const WATCHDOG_INTERVAL_SECS: u64 = 20;

// CPU power floor

/// Floor mode at boot.
pub const DEFAULT_POWER_FLOOR_MODE: PowerFloorMode = PowerFloorMode::Disabled;

// Observers

/// Maximum number of observers that can be registered.
pub const MAX_OBSERVERS: usize = 4;

/// Runtime configuration of one coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Delay before re-arming after a spurious wakeup.
    pub cooldown: Duration,
    /// Period of the stuck-suspend watchdog.
    pub watchdog_interval: Duration,
    /// Accept [`TargetDepth::Hibernate`](crate::TargetDepth::Hibernate).
    pub hibernation: bool,
    /// Initial CPU power-floor mode.
    pub power_floor: PowerFloorMode,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            cooldown: Duration::from_millis(SUSPEND_COOLDOWN_MS),
            watchdog_interval: Duration::from_secs(WATCHDOG_INTERVAL_SECS),
            hibernation: HIBERNATION_SUPPORTED,
            power_floor: DEFAULT_POWER_FLOOR_MODE,
        }
    }

    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub const fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    pub const fn with_hibernation(mut self, supported: bool) -> Self {
        self.hibernation = supported;
        self
    }

    pub const fn with_power_floor(mut self, mode: PowerFloorMode) -> Self {
        self.power_floor = mode;
        self
    }

    /// Cooldown in whole milliseconds, saturated for `DelayNs`.
    pub(crate) fn cooldown_ms(&self) -> u32 {
        saturating_ms(self.cooldown)
    }

    pub(crate) fn watchdog_interval_ms(&self) -> u32 {
        saturating_ms(self.watchdog_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
