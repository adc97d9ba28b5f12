//! Suspend-attempt worker.
//!
//! One attempt runs `Idle → Probing → Committing → (Succeeded | Raced) →
//! Idle`:
//!
//! 1. Probing: read the wakeup count, waiting for in-progress events.
//! 2. Take the state lock and save the count as the baseline. If either
//!    accounting call fails the cycle is abandoned until the next trigger.
//! 3. Re-read the target under the lock; `Awake` ends the cycle.
//! 4. Committing: enter the asleep phase, engage the CPU floor if wanted,
//!    call suspend (or hibernate), then leave the phase and release the
//!    floor. The lock is held for the whole call.
//! 5. Read the count again. An unchanged count means the resume has no
//!    known cause, so the worker cools down before re-arming.
//! 6. Re-arm while the target is still deeper than awake.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use crate::autosleep::Autosleep;
use crate::depth::TargetDepth;

/// Where the worker currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AttemptState {
    Idle = 0,
    Probing = 1,
    Committing = 2,
    /// Resumed with an attributable wakeup.
    Succeeded = 3,
    /// Resumed and the wakeup count did not move.
    Raced = 4,
}

impl AttemptState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => AttemptState::Probing,
            2 => AttemptState::Committing,
            3 => AttemptState::Succeeded,
            4 => AttemptState::Raced,
            _ => AttemptState::Idle,
        }
    }
}

/// Wakeup counts around one suspend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeupSnapshot {
    pub initial: u32,
    /// `None` if the count could not be read after resume.
    pub final_count: Option<u32>,
}

impl WakeupSnapshot {
    /// No wakeup event was registered across the suspend call.
    pub fn is_spurious(&self) -> bool {
        self.final_count == Some(self.initial)
    }
}

/// Result of one worker cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttemptOutcome {
    /// Wakeup accounting refused the read or the save. Not re-armed.
    Aborted,
    /// The target was awake once the lock was held. Not re-armed.
    Cancelled,
    /// The suspend or hibernate call returned.
    Resumed {
        depth: TargetDepth,
        snapshot: WakeupSnapshot,
    },
}

impl AttemptOutcome {
    /// Whether the worker must pause before the next attempt.
    pub fn needs_cooldown(&self) -> bool {
        matches!(self, AttemptOutcome::Resumed { snapshot, .. } if snapshot.is_spurious())
    }

    /// Whether the worker queues itself again.
    pub fn rearms(&self) -> bool {
        matches!(self, AttemptOutcome::Resumed { .. })
    }
}

/// Counters since boot. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttemptStats {
    /// Worker cycles run.
    pub attempts: u32,
    pub suspends: u32,
    pub hibernations: u32,
    pub aborted: u32,
    pub cancelled: u32,
    /// Resumes with no attributable wakeup.
    pub spurious_wakeups: u32,
}

pub(crate) struct AttemptCounters {
    attempts: AtomicU32,
    suspends: AtomicU32,
    hibernations: AtomicU32,
    aborted: AtomicU32,
    cancelled: AtomicU32,
    spurious_wakeups: AtomicU32,
}

impl AttemptCounters {
    pub(crate) const fn new() -> Self {
        Self {
            attempts: AtomicU32::new(0),
            suspends: AtomicU32::new(0),
            hibernations: AtomicU32::new(0),
            aborted: AtomicU32::new(0),
            cancelled: AtomicU32::new(0),
            spurious_wakeups: AtomicU32::new(0),
        }
    }

    fn record(&self, outcome: &AttemptOutcome) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            AttemptOutcome::Aborted => &self.aborted,
            AttemptOutcome::Cancelled => &self.cancelled,
            AttemptOutcome::Resumed { depth, .. } if depth.is_hibernate() => &self.hibernations,
            AttemptOutcome::Resumed { .. } => &self.suspends,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if outcome.needs_cooldown() {
            self.spurious_wakeups.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> AttemptStats {
        AttemptStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            suspends: self.suspends.load(Ordering::Relaxed),
            hibernations: self.hibernations.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            spurious_wakeups: self.spurious_wakeups.load(Ordering::Relaxed),
        }
    }
}

impl<M: RawMutex> Autosleep<'_, M> {
    /// Queue an attempt unless one is already pending or the target is
    /// awake. Returns whether work was queued.
    pub fn queue_up_suspend_work(&self) -> bool {
        if self.work.signaled() || self.target().is_awake() {
            return false;
        }
        self.work.signal(());
        true
    }

    pub fn work_pending(&self) -> bool {
        self.work.signaled()
    }

    pub fn attempt_state(&self) -> AttemptState {
        AttemptState::from_raw(self.attempt_state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> AttemptStats {
        self.counters.snapshot()
    }

    fn set_attempt_state(&self, state: AttemptState) {
        self.attempt_state.store(state as u8, Ordering::Release);
    }

    /// One attempt without the cooldown or the re-arm. The attempt state is
    /// back at [`AttemptState::Idle`] when this returns.
    pub async fn try_to_suspend(&self) -> AttemptOutcome {
        let outcome = self.attempt().await;
        self.set_attempt_state(AttemptState::Idle);
        outcome
    }

    /// Steps of one attempt. Leaves the attempt state where it ended so the
    /// cycle can report `Raced` through the cooldown.
    async fn attempt(&self) -> AttemptOutcome {
        let accounting = self.platform.accounting;
        self.set_attempt_state(AttemptState::Probing);

        let Some(initial) = accounting.read_count(true) else {
            trace!("autosleep: wakeup count read aborted");
            return AttemptOutcome::Aborted;
        };

        let held = self.state.lock().await;
        if !accounting.save_count(initial) {
            trace!("autosleep: wakeup count {} moved before save", initial);
            return AttemptOutcome::Aborted;
        }

        let depth = held.target();
        if depth.is_awake() {
            return AttemptOutcome::Cancelled;
        }

        self.set_attempt_state(AttemptState::Committing);
        self.commit(depth);
        drop(held);

        let snapshot = WakeupSnapshot {
            initial,
            final_count: accounting.read_count(false),
        };
        self.set_attempt_state(if snapshot.is_spurious() {
            AttemptState::Raced
        } else {
            AttemptState::Succeeded
        });
        AttemptOutcome::Resumed { depth, snapshot }
    }

    fn commit(&self, depth: TargetDepth) {
        let cpu = self.platform.cpu;
        let attempt = self.phase.enter();
        let floor = self.floor.engage(cpu);
        self.watchdog_kick.signal(());
        debug!("autosleep: attempt {} entering {} (floor {})", attempt, depth, floor);

        if depth.is_hibernate() {
            self.platform.executor.hibernate();
        } else {
            self.platform.executor.suspend(depth);
        }

        self.phase.exit();
        self.floor.release(cpu);
        debug!("autosleep: attempt {} resumed", attempt);
    }

    /// Run one cycle if an attempt is pending, without waiting for one.
    pub async fn process_pending<D: DelayNs>(&self, delay: &mut D) -> Option<AttemptOutcome> {
        self.work.try_take()?;
        Some(self.run_cycle(delay).await)
    }

    /// Wait for a pending attempt and run one cycle. The worker task calls
    /// this in a loop.
    pub async fn run_worker_once<D: DelayNs>(&self, delay: &mut D) -> AttemptOutcome {
        self.work.wait().await;
        self.run_cycle(delay).await
    }

    async fn run_cycle<D: DelayNs>(&self, delay: &mut D) -> AttemptOutcome {
        let outcome = self.attempt().await;
        self.counters.record(&outcome);

        if outcome.needs_cooldown() {
            trace!("autosleep: resume without wakeup reason, cooling down");
            delay.delay_ms(self.config.cooldown_ms()).await;
        }

        if outcome.rearms() {
            // Serialized with set_target so an Awake target can't slip in
            // between the check and the signal.
            let _held = self.state.lock().await;
            self.queue_up_suspend_work();
        }

        self.set_attempt_state(AttemptState::Idle);
        for observer in self.observers() {
            observer.attempt_finished(&outcome);
        }
        outcome
    }
}
