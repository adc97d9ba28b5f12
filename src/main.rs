//! Autosleep firmware for the nRF52840.
//!
//! Tasks:
//!   - worker   - runs suspend attempts while the target is deeper than awake
//!   - requeue  - queues a new attempt whenever the last wakeup source relaxes
//!   - button   - active-low button on P0.11; every press is a wakeup event
//!                and toggles the target between awake and `mem`
//!   - watchdog - reports attempts stuck in the suspended window
//!
//! The worker's suspend call is synchronous and blocks the thread-mode
//! executor, so the watchdog runs on an interrupt executor (SWI1_EGU1) at a
//! higher priority where its timer can preempt a stuck suspend.
//!
//! "Suspend" here is `WFE`: the core sleeps until the next event or
//! interrupt, and the RTC tick of the time driver bounds how long that is.

#![no_std]
#![no_main]

use autosleep::{
    Autosleep, Config, CpuFrequency, Error, Platform, Resource, SuspendExecutor, TargetDepth, WakeupCounter,
    WakeupSources,
};
use defmt::{error, info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

type Coordinator = Autosleep<'static, CriticalSectionRawMutex>;

/// Button debounce time (ms).
const BUTTON_DEBOUNCE_MS: u64 = 20;

/// Wakeup-source slots on this board.
const MAX_SOURCES: usize = 4;

// ═══════════════════════════════════════════════════════════════════════════
// Board collaborators
// ═══════════════════════════════════════════════════════════════════════════

/// WFE executor and the clock floor. Wakeup bookkeeping lives in
/// [`WAKEUPS`].
struct Board;

impl SuspendExecutor for Board {
    fn suspend(&self, _depth: TargetDepth) {
        // An event since the saved baseline aborts the transition.
        if WAKEUPS.events_since_save() {
            return;
        }
        cortex_m::asm::wfe();
    }

    fn hibernate(&self) {
        // System OFF resumes through reset, which the coordinator cannot
        // observe. Sleep as deep as WFE allows instead.
        warn!("board: hibernate not available, using WFE");
        self.suspend(TargetDepth::Hibernate);
    }
}

impl CpuFrequency for Board {
    // The core clock is fixed at 64 MHz; the closest knob is keeping the
    // HFXO running across WFE.
    fn engage_floor(&self) {
        info!("board: HFCLK pinned");
    }

    fn release_floor(&self) {
        info!("board: HFCLK released");
    }
}

static BOARD: Board = Board;
static WAKEUPS: WakeupCounter<CriticalSectionRawMutex, MAX_SOURCES> = WakeupCounter::new();

static WATCHDOG_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI1_EGU1() {
    WATCHDOG_EXECUTOR.on_interrupt()
}

// ═══════════════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::task]
async fn worker_task(autosleep: &'static Coordinator) -> ! {
    let mut delay = Delay;
    loop {
        let outcome = autosleep.run_worker_once(&mut delay).await;
        info!("worker: {}", outcome);
    }
}

/// An attempt aborted by an active source is not re-armed by the worker;
/// this is the trigger that retries it.
#[embassy_executor::task]
async fn requeue_task(autosleep: &'static Coordinator) -> ! {
    loop {
        WAKEUPS.wait_idle().await;
        if autosleep.queue_up_suspend_work() {
            info!("requeue: sources idle, attempt queued");
        }
    }
}

#[embassy_executor::task]
async fn watchdog_task(autosleep: &'static Coordinator) -> ! {
    let mut delay = Delay;
    loop {
        let reports = autosleep.run_watchdog_once(&mut delay).await;
        if reports > 0 {
            warn!("watchdog: {} stuck reports", reports);
        }
    }
}

/// Wait for a press, hold the `button` source through the debounce and flip
/// the target.
#[embassy_executor::task]
async fn button_task(pin: AnyPin, autosleep: &'static Coordinator) -> ! {
    let mut btn = Input::new(pin, Pull::Up);
    let token = WAKEUPS.register("button");

    loop {
        btn.wait_for_falling_edge().await;
        WAKEUPS.wakeup_event();
        if let Some(token) = token {
            WAKEUPS.stay_awake(token);
        }
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            let next = if autosleep.target().is_awake() {
                TargetDepth::MemorySleep
            } else {
                TargetDepth::Awake
            };
            if let Err(e) = autosleep.set_target(next).await {
                error!("button: set_target failed: {}", e);
            }

            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }

        if let Some(token) = token {
            WAKEUPS.relax(token);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("autosleep starting");

    static AUTOSLEEP: StaticCell<Coordinator> = StaticCell::new();
    let platform = Platform {
        accounting: &WAKEUPS,
        executor: &BOARD,
        sources: &WAKEUPS,
        cpu: &BOARD,
    };
    let autosleep: &'static Coordinator = match Autosleep::new(Config::default(), platform) {
        Ok(autosleep) => AUTOSLEEP.init(autosleep),
        Err(e) => {
            error!("autosleep: {}", e);
            return;
        }
    };

    interrupt::SWI1_EGU1.set_priority(Priority::P6);
    let watchdog_spawner = WATCHDOG_EXECUTOR.start(interrupt::SWI1_EGU1);

    let spawned = watchdog_spawner
        .spawn(watchdog_task(autosleep))
        .and_then(|()| spawner.spawn(worker_task(autosleep)))
        .and_then(|()| spawner.spawn(requeue_task(autosleep)))
        .and_then(|()| spawner.spawn(button_task(p.P0_11.into(), autosleep)))
        .map_err(|_| Error::OutOfResources(Resource::WorkQueue));
    if let Err(e) = spawned {
        error!("autosleep: {}", e);
        return;
    }

    if let Err(e) = autosleep.set_target(TargetDepth::MemorySleep).await {
        error!("autosleep: initial target: {}", e);
    }
}
