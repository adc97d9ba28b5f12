//! The autosleep coordinator.
//!
//! [`Autosleep`] owns the shared state (target depth, phase flag, floor mode)
//! and hands it to the worker, the watchdog and the control surface, which
//! are implemented as further `impl` blocks in their own modules.

use core::future::Future;
use core::sync::atomic::AtomicU8;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::config::{Config, AUTOSLEEP_WAKEUP_SOURCE, MAX_OBSERVERS};
use crate::depth::TargetDepth;
use crate::error::{Error, Resource, Result};
use crate::floor::{PowerFloor, PowerFloorMode};
use crate::observer::AutosleepObserver;
use crate::phase::{Phase, PhaseFlags};
use crate::platform::{Platform, WakeupToken};
use crate::state::{AutosleepGuard, AutosleepState};
use crate::worker::{AttemptCounters, AttemptState};

/// Opportunistic-suspend coordinator.
///
/// `M` selects the lock flavour: `CriticalSectionRawMutex` when the worker,
/// the watchdog and `set_target` callers run on different executors or
/// threads, `NoopRawMutex` when everything shares one executor.
pub struct Autosleep<'a, M: RawMutex> {
    pub(crate) config: Config,
    pub(crate) platform: Platform<'a>,
    token: WakeupToken,
    pub(crate) state: AutosleepState<M>,
    pub(crate) phase: PhaseFlags,
    pub(crate) floor: PowerFloor,
    /// Pending attempt. A `Signal` holds at most one value, which is
    /// exactly the "queue unless already pending" rule.
    pub(crate) work: Signal<M, ()>,
    pub(crate) watchdog_kick: Signal<M, ()>,
    pub(crate) attempt_state: AtomicU8,
    pub(crate) counters: AttemptCounters,
    observers: Vec<&'a dyn AutosleepObserver, MAX_OBSERVERS>,
}

impl<'a, M: RawMutex> Autosleep<'a, M> {
    /// Register the `autosleep` wakeup source and build the coordinator.
    ///
    /// The target starts at [`TargetDepth::Awake`]; nothing runs until a
    /// deeper target is set.
    pub fn new(config: Config, platform: Platform<'a>) -> Result<Self> {
        let Some(token) = platform.sources.register(AUTOSLEEP_WAKEUP_SOURCE) else {
            warn!("autosleep: no slot for wakeup source");
            return Err(Error::OutOfResources(Resource::WakeupSource));
        };

        Ok(Self {
            config,
            platform,
            token,
            state: AutosleepState::new(),
            phase: PhaseFlags::new(),
            floor: PowerFloor::new(config.power_floor),
            work: Signal::new(),
            watchdog_kick: Signal::new(),
            attempt_state: AtomicU8::new(AttemptState::Idle as u8),
            counters: AttemptCounters::new(),
            observers: Vec::new(),
        })
    }

    /// Add an observer. Only possible before the coordinator is shared.
    pub fn register_observer(&mut self, observer: &'a dyn AutosleepObserver) -> Result<()> {
        self.observers
            .push(observer)
            .map_err(|_| Error::OutOfResources(Resource::Observers))
    }

    /// Tear down: the wakeup source is returned to the platform.
    pub fn shutdown(self) {
        self.platform.sources.unregister(self.token);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current target depth. Lock-free.
    pub fn target(&self) -> TargetDepth {
        self.state.target()
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn power_floor_mode(&self) -> PowerFloorMode {
        self.floor.mode()
    }

    pub fn set_power_floor_mode(&self, mode: PowerFloorMode) {
        info!("autosleep: power floor mode {}", mode);
        self.floor.set_mode(mode);
    }

    pub fn floor_engaged(&self) -> bool {
        self.floor.is_engaged()
    }

    /// Synchronize with in-flight attempts without blocking.
    pub fn try_lock(&self) -> Result<AutosleepGuard<'_, M>> {
        self.state.try_lock()
    }

    /// Synchronize with in-flight attempts, giving up when `interrupt`
    /// completes first.
    pub async fn lock_interruptible<F: Future>(&self, interrupt: F) -> Result<AutosleepGuard<'_, M>> {
        self.state.lock_interruptible(interrupt).await
    }

    /// Change the depth autosleep keeps trying to reach.
    ///
    /// A deeper-than-awake target queues an attempt. [`TargetDepth::Awake`]
    /// drops any pending attempt, clears the phase flag and releases the CPU
    /// floor, whatever state they were in.
    pub async fn set_target(&self, depth: TargetDepth) -> Result<()> {
        if depth.is_hibernate() && !self.config.hibernation {
            return Err(Error::InvalidDepth);
        }

        // The source must be active before the lock is taken: an attempt
        // holding the lock can only be waiting on accounting, and an active
        // source makes that wait end.
        let sources = self.platform.sources;
        sources.stay_awake(self.token);
        let held = self.state.lock().await;
        let previous = self.state.replace_target(&held, depth);
        sources.relax(self.token);

        info!("autosleep: target {} -> {}", previous, depth);
        for observer in self.observers.iter() {
            observer.target_changed(previous, depth);
        }

        if depth.is_awake() {
            self.work.reset();
            self.phase.exit();
            self.floor.release(self.platform.cpu);
            self.platform.accounting.set_autosleep_enabled(false);
        } else {
            self.platform.accounting.set_autosleep_enabled(true);
            self.queue_up_suspend_work();
        }

        drop(held);
        Ok(())
    }

    pub(crate) fn observers(&self) -> &[&'a dyn AutosleepObserver] {
        &self.observers
    }
}
