//! CPU power-floor controller.
//!
//! Couples suspend entry and resume to a CPU minimum-frequency policy. The
//! operator-settable mode decides whether the floor is engaged on entry;
//! engagement is tracked so a bracket never issues more than one engage and
//! one release, and releasing an unengaged floor does nothing.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::platform::CpuFrequency;

/// When to pin the CPU floor during a suspend bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerFloorMode {
    /// Never touch the floor.
    Disabled = 0,
    /// Engage on every suspend entry, release on resume.
    WhileAsleep = 1,
    /// Engage only when the platform's external condition holds.
    Conditional = 2,
}

impl PowerFloorMode {
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(PowerFloorMode::Disabled),
            1 => Some(PowerFloorMode::WhileAsleep),
            2 => Some(PowerFloorMode::Conditional),
            _ => None,
        }
    }

    /// ASCII digit used by the `cpu_power_floor` attribute.
    pub const fn digit(self) -> u8 {
        b'0' + self.as_raw()
    }
}

/// Mode knob plus engagement state.
pub struct PowerFloor {
    mode: AtomicU8,
    engaged: AtomicBool,
}

impl PowerFloor {
    pub const fn new(mode: PowerFloorMode) -> Self {
        Self {
            mode: AtomicU8::new(mode.as_raw()),
            engaged: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> PowerFloorMode {
        PowerFloorMode::from_raw(self.mode.load(Ordering::Relaxed)).unwrap_or(PowerFloorMode::Disabled)
    }

    pub fn set_mode(&self, mode: PowerFloorMode) {
        self.mode.store(mode.as_raw(), Ordering::Relaxed);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    /// Whether the current mode wants the floor for this suspend entry.
    pub fn warranted(&self, cpu: &dyn CpuFrequency) -> bool {
        match self.mode() {
            PowerFloorMode::Disabled => false,
            PowerFloorMode::WhileAsleep => true,
            PowerFloorMode::Conditional => cpu.floor_condition(),
        }
    }

    /// Suspend entry. Returns whether the floor is engaged afterwards.
    pub fn engage(&self, cpu: &dyn CpuFrequency) -> bool {
        if !self.warranted(cpu) {
            return self.is_engaged();
        }
        if !self.engaged.swap(true, Ordering::AcqRel) {
            debug!("floor: engaged");
            cpu.engage_floor();
        }
        true
    }

    /// Resume, or autosleep switched off.
    pub fn release(&self, cpu: &dyn CpuFrequency) {
        if self.engaged.swap(false, Ordering::AcqRel) {
            debug!("floor: released");
            cpu.release_floor();
        }
    }
}
