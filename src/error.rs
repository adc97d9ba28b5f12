//! Unified error type for autosleep.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Transient accounting failures and wakeup races are attempt outcomes, not
//! errors; only configuration, locking and startup problems end up here.

use core::fmt;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Configuration
    /// The requested depth is past the suspend range and hibernation is
    /// not supported.
    InvalidDepth,

    /// Control-surface input could not be parsed.
    InvalidArgument,

    // Locking
    /// Waiting for the autosleep lock was interrupted.
    Interrupted,

    /// The autosleep lock is held by an attempt in flight.
    WouldBlock,

    // Startup
    /// A resource needed at startup could not be obtained.
    OutOfResources(Resource),
}

/// Startup resources whose exhaustion is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    /// The `autosleep` wakeup-blocking token.
    WakeupSource,
    /// A slot for the worker or watchdog task.
    WorkQueue,
    /// The observer registry is full.
    Observers,
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDepth => f.write_str("unsupported sleep depth"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::Interrupted => f.write_str("interrupted while waiting for the autosleep lock"),
            Error::WouldBlock => f.write_str("autosleep lock is busy"),
            Error::OutOfResources(resource) => write!(f, "out of resources: {:?}", resource),
        }
    }
}

// Convenience conversions

impl From<embassy_sync::mutex::TryLockError> for Error {
    fn from(_: embassy_sync::mutex::TryLockError) -> Self {
        Error::WouldBlock
    }
}
