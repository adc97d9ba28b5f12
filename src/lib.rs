//! Opportunistic suspend ("autosleep") coordinator.
//!
//! Once a target depth deeper than awake is set, a background worker keeps
//! trying to put the system into that depth whenever no wakeup event is
//! outstanding. The wakeup-count race check makes sure an attempt is aborted
//! rather than committed when an event arrives between the decision and the
//! suspend call.
//!
//! The crate is `no_std` and host-testable: hardware, wakeup bookkeeping and
//! CPU frequency control are reached through the traits in [`platform`].
//!
//! Usage: `cargo test` on the host, or
//! `cargo build --release --features embedded --target thumbv7em-none-eabihf`
//! for the nRF52840 firmware in `main.rs`.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════

pub mod autosleep;
pub mod config;
pub mod control;
pub mod depth;
pub mod error;
pub mod floor;
pub mod observer;
pub mod phase;
pub mod platform;
pub mod sources;
pub mod state;
pub mod watchdog;
pub mod worker;

#[cfg(test)]
mod fake;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use autosleep::Autosleep;
pub use config::Config;
pub use depth::TargetDepth;
pub use error::{Error, Resource, Result};
pub use floor::PowerFloorMode;
pub use observer::AutosleepObserver;
pub use phase::Phase;
pub use sources::WakeupCounter;
pub use platform::{CpuFrequency, Platform, SuspendExecutor, WakeupAccounting, WakeupSources, WakeupToken};
pub use state::{AutosleepGuard, AutosleepState};
pub use watchdog::WatchdogVerdict;
pub use worker::{AttemptOutcome, AttemptState, AttemptStats, WakeupSnapshot};
