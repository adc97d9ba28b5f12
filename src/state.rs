//! Shared autosleep state and its lock.
//!
//! The target depth is mirrored in an atomic so readers never wait, but it
//! is only written while the state lock is held. The lock serializes target
//! changes against the snapshot-save and commit steps of an attempt.
//!
//! Outside the crate the lock can only be taken with [`try_lock`] or
//! [`lock_interruptible`]: a plain blocking acquisition could wait forever
//! behind an attempt that is itself waiting on wakeup accounting.
//!
//! [`try_lock`]: AutosleepState::try_lock
//! [`lock_interruptible`]: AutosleepState::lock_interruptible

use core::future::Future;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::depth::TargetDepth;
use crate::error::{Error, Result};

/// Target depth plus the state lock.
pub struct AutosleepState<M: RawMutex> {
    target: AtomicU8,
    lock: Mutex<M, ()>,
}

/// Proof that the state lock is held. Dropping it unlocks.
pub struct AutosleepGuard<'a, M: RawMutex> {
    state: &'a AutosleepState<M>,
    _lock: MutexGuard<'a, M, ()>,
}

impl<M: RawMutex> AutosleepGuard<'_, M> {
    pub fn target(&self) -> TargetDepth {
        self.state.target()
    }
}

impl<M: RawMutex> AutosleepState<M> {
    pub const fn new() -> Self {
        Self {
            target: AtomicU8::new(TargetDepth::Awake.as_raw()),
            lock: Mutex::new(()),
        }
    }

    /// Current target. Lock-free.
    pub fn target(&self) -> TargetDepth {
        TargetDepth::from_raw(self.target.load(Ordering::Acquire))
    }

    pub(crate) async fn lock(&self) -> AutosleepGuard<'_, M> {
        let lock = self.lock.lock().await;
        AutosleepGuard { state: self, _lock: lock }
    }

    /// Take the lock only if no attempt holds it.
    pub fn try_lock(&self) -> Result<AutosleepGuard<'_, M>> {
        let lock = self.lock.try_lock()?;
        Ok(AutosleepGuard { state: self, _lock: lock })
    }

    /// Wait for the lock until `interrupt` completes.
    pub async fn lock_interruptible<F: Future>(&self, interrupt: F) -> Result<AutosleepGuard<'_, M>> {
        match select(self.lock.lock(), interrupt).await {
            Either::First(lock) => Ok(AutosleepGuard { state: self, _lock: lock }),
            Either::Second(_) => Err(Error::Interrupted),
        }
    }

    /// Store a new target, returning the previous one.
    pub(crate) fn replace_target(&self, _held: &AutosleepGuard<'_, M>, depth: TargetDepth) -> TargetDepth {
        TargetDepth::from_raw(self.target.swap(depth.as_raw(), Ordering::AcqRel))
    }
}

impl<M: RawMutex> Default for AutosleepState<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::future::{pending, ready};
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn starts_awake() {
        let state = AutosleepState::<NoopRawMutex>::new();
        assert_eq!(state.target(), TargetDepth::Awake);
    }

    #[test]
    fn replace_target_returns_previous() {
        let state = AutosleepState::<NoopRawMutex>::new();
        let guard = block_on(state.lock());
        assert_eq!(state.replace_target(&guard, TargetDepth::Standby), TargetDepth::Awake);
        assert_eq!(state.replace_target(&guard, TargetDepth::MemorySleep), TargetDepth::Standby);
        assert_eq!(guard.target(), TargetDepth::MemorySleep);
        drop(guard);
        assert_eq!(state.target(), TargetDepth::MemorySleep);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let state = AutosleepState::<NoopRawMutex>::new();
        let held = state.try_lock().unwrap();
        assert_eq!(state.try_lock().err(), Some(Error::WouldBlock));
        drop(held);
        assert!(state.try_lock().is_ok());
    }

    #[test]
    fn interruptible_lock_gives_up_when_interrupted() {
        let state = AutosleepState::<NoopRawMutex>::new();
        let held = block_on(state.lock());
        let result = block_on(state.lock_interruptible(ready(())));
        assert_eq!(result.err(), Some(Error::Interrupted));
        drop(held);
    }

    #[test]
    fn interruptible_lock_succeeds_when_free() {
        let state = AutosleepState::<NoopRawMutex>::new();
        let guard = block_on(state.lock_interruptible(pending::<()>()));
        assert!(guard.is_ok());
    }
}
