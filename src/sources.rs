//! Fixed-capacity wakeup bookkeeping for boards without an OS.
//!
//! [`WakeupCounter`] implements both [`WakeupAccounting`] and
//! [`WakeupSources`]. A blocking count read cannot wait from a synchronous
//! call, so while any source is active it fails and the attempt is aborted.
//! The aborted cycle is not re-armed by the worker; instead the counter
//! signals when the last active source relaxes, and the board re-queues work
//! from a task waiting on [`WakeupCounter::wait_idle`].

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::platform::{WakeupAccounting, WakeupSources, WakeupToken};

/// Event count plus `N` named wakeup sources.
pub struct WakeupCounter<M: RawMutex, const N: usize> {
    events: AtomicU32,
    saved: AtomicU32,
    names: BlockingMutex<M, RefCell<Vec<&'static str, N>>>,
    active: [AtomicBool; N],
    idle: Signal<M, ()>,
}

impl<M: RawMutex, const N: usize> WakeupCounter<M, N> {
    pub const fn new() -> Self {
        Self {
            events: AtomicU32::new(0),
            saved: AtomicU32::new(0),
            names: BlockingMutex::new(RefCell::new(Vec::new())),
            active: [const { AtomicBool::new(false) }; N],
            idle: Signal::new(),
        }
    }

    /// Count a wakeup event (an interrupt, a button press).
    pub fn wakeup_event(&self) {
        self.events.fetch_add(1, Ordering::AcqRel);
    }

    pub fn any_active(&self) -> bool {
        self.active.iter().any(|a| a.load(Ordering::Acquire))
    }

    /// Events were counted after the last successful save. A suspend
    /// primitive checks this to abort the transition.
    pub fn events_since_save(&self) -> bool {
        self.events.load(Ordering::Acquire) != self.saved.load(Ordering::Acquire)
    }

    /// Wait until the last active source relaxes.
    pub async fn wait_idle(&self) {
        self.idle.wait().await;
    }

    fn slot(&self, token: WakeupToken) -> Option<&AtomicBool> {
        self.active.get(usize::from(token.0))
    }
}

impl<M: RawMutex, const N: usize> Default for WakeupCounter<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex + Sync, const N: usize> WakeupAccounting for WakeupCounter<M, N> {
    fn read_count(&self, block: bool) -> Option<u32> {
        if block && self.any_active() {
            return None;
        }
        Some(self.events.load(Ordering::Acquire))
    }

    fn save_count(&self, count: u32) -> bool {
        if count != self.events.load(Ordering::Acquire) || self.any_active() {
            return false;
        }
        self.saved.store(count, Ordering::Release);
        true
    }
}

impl<M: RawMutex + Sync, const N: usize> WakeupSources for WakeupCounter<M, N> {
    fn register(&self, name: &'static str) -> Option<WakeupToken> {
        self.names.lock(|names| {
            let mut names = names.borrow_mut();
            let index = names.len();
            names.push(name).ok()?;
            u16::try_from(index).ok().map(WakeupToken)
        })
    }

    fn unregister(&self, token: WakeupToken) {
        self.relax(token);
    }

    fn stay_awake(&self, token: WakeupToken) {
        if let Some(slot) = self.slot(token) {
            slot.store(true, Ordering::Release);
        }
    }

    fn relax(&self, token: WakeupToken) {
        let Some(slot) = self.slot(token) else {
            return;
        };
        if !slot.swap(false, Ordering::AcqRel) {
            return;
        }
        // Ending an active period counts as an event.
        self.wakeup_event();
        if !self.any_active() {
            self.idle.signal(());
        }
    }

    fn report_active(&self) {
        self.names.lock(|names| {
            for (name, active) in names.borrow().iter().zip(self.active.iter()) {
                if active.load(Ordering::Acquire) {
                    warn!("wakeup source {} active", name);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::depth::TargetDepth;
    use crate::fake::{FakePlatform, RecordingDelay};
    use crate::platform::Platform;
    use crate::worker::AttemptOutcome;
    use crate::Autosleep;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

    type Counter = WakeupCounter<CriticalSectionRawMutex, 4>;

    #[test]
    fn save_fails_once_the_count_moved() {
        let counter = Counter::new();
        let count = counter.read_count(true).unwrap();
        counter.wakeup_event();
        assert!(!counter.save_count(count));
        assert!(counter.save_count(count + 1));
        assert!(!counter.events_since_save());
        counter.wakeup_event();
        assert!(counter.events_since_save());
    }

    #[test]
    fn active_source_blocks_reads_until_it_relaxes() {
        let counter = Counter::new();
        let token = counter.register("button").unwrap();

        counter.stay_awake(token);
        assert_eq!(counter.read_count(true), None);
        assert_eq!(counter.read_count(false), Some(0));

        counter.relax(token);
        assert_eq!(counter.read_count(true), Some(1));
        block_on(counter.wait_idle());
    }

    #[test]
    fn idle_is_signalled_only_by_the_last_source() {
        let counter = Counter::new();
        let a = counter.register("a").unwrap();
        let b = counter.register("b").unwrap();
        counter.stay_awake(a);
        counter.stay_awake(b);

        counter.relax(a);
        assert!(!counter.idle.signaled());
        counter.relax(b);
        assert!(counter.idle.signaled());
    }

    #[test]
    fn registry_is_bounded() {
        let counter = WakeupCounter::<CriticalSectionRawMutex, 1>::new();
        assert_eq!(counter.register("a"), Some(WakeupToken(0)));
        assert_eq!(counter.register("b"), None);
    }

    #[test]
    fn aborted_cycle_is_retried_after_the_source_relaxes() {
        let counter = Counter::new();
        let fake = FakePlatform::new();
        let platform = Platform {
            accounting: &counter,
            sources: &counter,
            ..fake.platform()
        };
        let autosleep = Autosleep::<NoopRawMutex>::new(Config::default(), platform).unwrap();
        let mut delay = RecordingDelay::default();

        block_on(autosleep.set_target(TargetDepth::MemorySleep)).unwrap();
        // set_target's own token relaxed.
        block_on(counter.wait_idle());

        let button = counter.register("button").unwrap();
        counter.stay_awake(button);
        assert_eq!(block_on(autosleep.process_pending(&mut delay)), Some(AttemptOutcome::Aborted));
        assert!(!autosleep.work_pending());
        assert!(fake.suspended().is_empty());

        counter.relax(button);
        block_on(counter.wait_idle());
        assert!(autosleep.queue_up_suspend_work());

        let outcome = block_on(autosleep.process_pending(&mut delay)).unwrap();
        assert!(outcome.rearms());
        assert_eq!(fake.suspended(), [TargetDepth::MemorySleep]);
    }
}
