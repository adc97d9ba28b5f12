//! Stuck-suspend watchdog.
//!
//! Kicked by the worker when it enters the suspended window. While the phase
//! stays asleep the watchdog wakes every [`Config::watchdog_interval`]; if the
//! same attempt is still in flight it logs and reports activity on the
//! platform's wakeup sources. It only observes and never touches the target,
//! the lock or the pending work.
//!
//! [`Config::watchdog_interval`]: crate::config::Config::watchdog_interval

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use crate::autosleep::Autosleep;

/// What one watchdog check found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogVerdict {
    /// Phase is awake; monitoring stops.
    Awake,
    /// A different attempt than last time is in flight.
    Progressing,
    /// The same attempt is still inside its suspend call.
    Stuck { attempt: u32 },
}

impl<M: RawMutex> Autosleep<'_, M> {
    /// Compare the in-flight attempt against `last_seen` and update it.
    pub fn watchdog_check(&self, last_seen: &mut u32) -> WatchdogVerdict {
        if !self.phase().is_asleep() {
            return WatchdogVerdict::Awake;
        }
        let attempt = self.phase.attempt();
        if attempt == *last_seen {
            WatchdogVerdict::Stuck { attempt }
        } else {
            *last_seen = attempt;
            WatchdogVerdict::Progressing
        }
    }

    /// Check every interval until the phase goes awake. Returns how many
    /// times a stuck attempt was reported.
    pub async fn monitor<D: DelayNs>(&self, delay: &mut D) -> u32 {
        let interval = self.config.watchdog_interval_ms();
        let mut last_seen = self.phase.attempt();
        let mut reports = 0;
        loop {
            delay.delay_ms(interval).await;
            match self.watchdog_check(&mut last_seen) {
                WatchdogVerdict::Awake => return reports,
                WatchdogVerdict::Progressing => {}
                WatchdogVerdict::Stuck { attempt } => {
                    warn!("autosleep: attempt {} still suspending after {} ms", attempt, interval);
                    self.platform.sources.report_active();
                    reports += 1;
                }
            }
        }
    }

    /// Wait for a kick and monitor the attempt that sent it. The watchdog
    /// task calls this in a loop.
    pub async fn run_watchdog_once<D: DelayNs>(&self, delay: &mut D) -> u32 {
        self.watchdog_kick.wait().await;
        self.monitor(delay).await
    }
}
