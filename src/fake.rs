//! Recording collaborators for unit tests.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

// Links the std critical-section implementation behind CriticalSectionRawMutex.
use critical_section as _;

use crate::depth::TargetDepth;
use crate::platform::{CpuFrequency, Platform, SuspendExecutor, WakeupAccounting, WakeupSources, WakeupToken};

/// One struct implementing every collaborator, with knobs for failures.
#[derive(Default)]
pub(crate) struct FakePlatform {
    pub count: AtomicU32,
    pub saves: AtomicU32,
    pub read_fails: AtomicBool,
    /// Fail only the non-blocking read taken after resume.
    pub final_read_fails: AtomicBool,
    pub save_fails: AtomicBool,
    pub autosleep_enabled: AtomicBool,

    /// Bump the wakeup count inside every suspend call.
    pub wake_on_suspend: AtomicBool,
    pub suspends: Mutex<Vec<TargetDepth>>,
    pub hibernations: AtomicU32,
    pub floor_during_suspend: Mutex<Vec<bool>>,

    pub registered: Mutex<Vec<&'static str>>,
    pub register_fails: AtomicBool,
    pub unregistered: AtomicU32,
    pub stay_awake: AtomicU32,
    pub relax: AtomicU32,
    pub reports: AtomicU32,

    pub floor_engaged: AtomicU32,
    pub floor_released: AtomicU32,
    pub floor_condition: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            accounting: self,
            executor: self,
            sources: self,
            cpu: self,
        }
    }

    pub fn suspended(&self) -> Vec<TargetDepth> {
        self.suspends.lock().unwrap().clone()
    }

    fn resume(&self) {
        let engaged = self.floor_engaged.load(Ordering::SeqCst) > self.floor_released.load(Ordering::SeqCst);
        self.floor_during_suspend.lock().unwrap().push(engaged);
        if self.wake_on_suspend.load(Ordering::SeqCst) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl WakeupAccounting for FakePlatform {
    fn read_count(&self, block: bool) -> Option<u32> {
        if self.read_fails.load(Ordering::SeqCst) || (!block && self.final_read_fails.load(Ordering::SeqCst)) {
            return None;
        }
        Some(self.count.load(Ordering::SeqCst))
    }

    fn save_count(&self, count: u32) -> bool {
        self.saves.fetch_add(1, Ordering::SeqCst);
        !self.save_fails.load(Ordering::SeqCst) && count == self.count.load(Ordering::SeqCst)
    }

    fn set_autosleep_enabled(&self, enabled: bool) {
        self.autosleep_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl SuspendExecutor for FakePlatform {
    fn suspend(&self, depth: TargetDepth) {
        self.suspends.lock().unwrap().push(depth);
        self.resume();
    }

    fn hibernate(&self) {
        self.hibernations.fetch_add(1, Ordering::SeqCst);
        self.resume();
    }
}

impl WakeupSources for FakePlatform {
    fn register(&self, name: &'static str) -> Option<WakeupToken> {
        if self.register_fails.load(Ordering::SeqCst) {
            return None;
        }
        let mut registered = self.registered.lock().unwrap();
        registered.push(name);
        Some(WakeupToken(registered.len() as u16))
    }

    fn unregister(&self, _token: WakeupToken) {
        self.unregistered.fetch_add(1, Ordering::SeqCst);
    }

    fn stay_awake(&self, _token: WakeupToken) {
        self.stay_awake.fetch_add(1, Ordering::SeqCst);
    }

    fn relax(&self, _token: WakeupToken) {
        self.relax.fetch_add(1, Ordering::SeqCst);
    }

    fn report_active(&self) {
        self.reports.fetch_add(1, Ordering::SeqCst);
    }
}

impl CpuFrequency for FakePlatform {
    fn engage_floor(&self) {
        self.floor_engaged.fetch_add(1, Ordering::SeqCst);
    }

    fn release_floor(&self) {
        self.floor_released.fetch_add(1, Ordering::SeqCst);
    }

    fn floor_condition(&self) -> bool {
        self.floor_condition.load(Ordering::SeqCst)
    }
}

/// Delay that returns at once and records what was asked for.
#[derive(Default)]
pub(crate) struct RecordingDelay {
    pub ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}
