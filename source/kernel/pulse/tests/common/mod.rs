// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host stand-ins for the kernel collaborators: every std thread is a kernel
//! thread with its own interrupt level, and block/unblock is a condvar.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pulse::hal::{DelayLoop, Interrupts, SpinDelay, Threads};
use pulse::{IntrLevel, Pid, SleepTimer, Tick, TimerConfig};

thread_local! {
    static INTR_ON: Cell<bool> = Cell::new(true);
    static HANDLER_DEPTH: Cell<usize> = Cell::new(0);
    static CURRENT: Cell<u32> = Cell::new(0);
}

/// Interrupt level kept per host thread, as a context switch would restore it.
pub struct HostInterrupts;

impl HostInterrupts {
    pub fn run_handler<R>(&self, f: impl FnOnce() -> R) -> R {
        let old = self.set_level(IntrLevel::Off);
        HANDLER_DEPTH.with(|d| d.set(d.get() + 1));
        let out = f();
        HANDLER_DEPTH.with(|d| d.set(d.get() - 1));
        self.set_level(old);
        out
    }
}

impl Interrupts for HostInterrupts {
    fn level(&self) -> IntrLevel {
        if INTR_ON.with(Cell::get) {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    fn set_level(&self, level: IntrLevel) -> IntrLevel {
        let was_on = INTR_ON.with(|on| on.replace(level.is_on()));
        if was_on {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    fn in_interrupt_context(&self) -> bool {
        HANDLER_DEPTH.with(Cell::get) > 0
    }
}

#[derive(Default)]
struct Slot {
    woken: Mutex<bool>,
    cv: Condvar,
}

/// Scheduler stand-in backed by one condvar per PID.
#[derive(Default)]
pub struct HostThreads {
    slots: Mutex<HashMap<u32, Arc<Slot>>>,
    woken: Mutex<Vec<Pid>>,
}

impl HostThreads {
    /// Binds the calling host thread to `pid`.
    pub fn enter(pid: Pid) {
        CURRENT.with(|c| c.set(pid.as_raw()));
    }

    fn slot(&self, pid: Pid) -> Arc<Slot> {
        Arc::clone(self.slots.lock().unwrap().entry(pid.as_raw()).or_default())
    }

    /// PIDs unblocked so far, in unblock order.
    pub fn woken(&self) -> Vec<Pid> {
        self.woken.lock().unwrap().clone()
    }
}

impl Threads for HostThreads {
    fn current(&self) -> Pid {
        Pid::from_raw(CURRENT.with(Cell::get))
    }

    fn block_current(&self) {
        let slot = self.slot(self.current());
        let mut woken = slot.woken.lock().unwrap();
        while !*woken {
            woken = slot.cv.wait(woken).unwrap();
        }
        *woken = false;
    }

    fn unblock(&self, pid: Pid) {
        self.woken.lock().unwrap().push(pid);
        let slot = self.slot(pid);
        *slot.woken.lock().unwrap() = true;
        slot.cv.notify_all();
    }
}

pub static INTR: HostInterrupts = HostInterrupts;
pub static DELAY: SpinDelay = SpinDelay;

pub struct Rig {
    pub threads: &'static HostThreads,
    pub timer: SleepTimer<'static>,
}

pub fn rig(freq_hz: u32) -> Rig {
    rig_with_delay(freq_hz, &DELAY)
}

pub fn rig_with_delay(freq_hz: u32, delay: &'static dyn DelayLoop) -> Rig {
    let threads: &'static HostThreads = Box::leak(Box::default());
    let config = TimerConfig::new(freq_hz).expect("valid frequency");
    Rig { threads, timer: SleepTimer::new(config, &INTR, threads, delay) }
}

impl Rig {
    /// Delivers one timer interrupt on the calling thread.
    pub fn tick(&self) -> usize {
        INTR.run_handler(|| self.timer.on_tick())
    }

    /// Free-running tick source: one interrupt per `period` until `stop` is set.
    pub fn tick_every(&self, period: Duration, stop: &AtomicBool) {
        while !stop.load(Ordering::Acquire) {
            thread::sleep(period);
            self.tick();
        }
    }

    /// Ticks until no sleeper is queued. Returns every woken PID paired with
    /// the tick whose handler unblocked it.
    pub fn run_until_idle(&self) -> Vec<(Pid, Tick)> {
        let mut wakes = Vec::new();
        while self.timer.pending() > 0 {
            let seen = self.threads.woken().len();
            self.tick();
            let now = self.timer.ticks();
            wakes.extend(self.threads.woken()[seen..].iter().map(|pid| (*pid, now)));
        }
        wakes
    }

    /// Waits until `n` sleepers are queued.
    pub fn wait_for_pending(&self, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while self.timer.pending() < n {
            assert!(Instant::now() < deadline, "sleepers never registered");
            thread::yield_now();
        }
    }
}
