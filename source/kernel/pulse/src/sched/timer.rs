// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Tick counter, blocking sleep and busy delays
//! OWNERS: @kernel-sched-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests below + tests/sleep_threads.rs, tests/calibrate_live.rs (real host threads)
//! PUBLIC API: SleepTimer (on_tick/ticks/ticks_elapsed/sleep/sleep_*/delay_*/calibrate/print_stats)
//! DEPENDS_ON: hal::{Interrupts, Threads, DelayLoop}, sync::{IntrGuard, IrqLock}, sched::WakeQueue
//! INVARIANTS: Tick counter written only by on_tick; queue touched only with interrupts off;
//!             interrupts stay off from registration until the sleeper is blocked

use core::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use crate::config::{saturate_tick, TimerConfig};
use crate::hal::{DelayLoop, Interrupts, Threads};
use crate::sync::{IntrGuard, IrqLock};
use crate::types::Tick;

use super::calibrate::{self, TickEdgeProbe, TickProbe};
use super::wake_queue::{SleepRequest, WakeQueue};

const MS_PER_S: i32 = 1000;
const US_PER_S: i32 = 1000 * 1000;
const NS_PER_S: i32 = 1000 * 1000 * 1000;

/// Timer-driven sleep/wake for one CPU.
pub struct SleepTimer<'hw> {
    config: TimerConfig,
    /// Ticks since boot.
    ticks: AtomicI64,
    /// Busy-loop iterations per tick, set by calibration.
    loops_per_tick: AtomicU32,
    queue: IrqLock<WakeQueue>,
    intr: &'hw dyn Interrupts,
    threads: &'hw dyn Threads,
    delay: &'hw dyn DelayLoop,
}

static_assertions::assert_impl_all!(SleepTimer<'static>: Send, Sync);

impl<'hw> SleepTimer<'hw> {
    pub fn new(
        config: TimerConfig,
        intr: &'hw dyn Interrupts,
        threads: &'hw dyn Threads,
        delay: &'hw dyn DelayLoop,
    ) -> Self {
        log_info!(target: "timer", "TIMER: {} Hz", config.freq_hz());
        Self {
            config,
            ticks: AtomicI64::new(0),
            loops_per_tick: AtomicU32::new(0),
            queue: IrqLock::new(WakeQueue::new()),
            intr,
            threads,
            delay,
        }
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    /// Tick hook, called once per timer interrupt with interrupts off.
    ///
    /// Advances the counter and unblocks every sleeper now due. Returns the
    /// number of threads woken.
    pub fn on_tick(&self) -> usize {
        let mut queue = self.queue.lock(self.intr);
        let now = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let threads = self.threads;
        queue.on_tick(now, |pid| threads.unblock(pid))
    }

    /// Ticks since boot, read with interrupts off.
    pub fn ticks(&self) -> Tick {
        let _irq = IntrGuard::disable(self.intr);
        self.ticks.load(Ordering::Acquire)
    }

    /// Ticks elapsed since `then`, a value once returned by [`Self::ticks`].
    pub fn ticks_elapsed(&self, then: Tick) -> Tick {
        self.ticks().saturating_sub(then)
    }

    /// Number of threads currently asleep.
    pub fn pending(&self) -> usize {
        self.queue.lock(self.intr).len()
    }

    /// Earliest wake tick among the sleepers.
    pub fn next_wake(&self) -> Option<Tick> {
        self.queue.lock(self.intr).peek().map(SleepRequest::wake_tick)
    }

    /// Blocks the calling thread for `ticks` ticks. Non-positive durations
    /// return immediately.
    ///
    /// Must be called from thread context with interrupts on.
    pub fn sleep(&self, ticks: Tick) {
        assert!(!self.intr.in_interrupt_context(), "sleep: called from interrupt context");
        assert!(self.intr.level().is_on(), "sleep: interrupts must be on");
        if ticks <= 0 {
            return;
        }

        let pid = self.threads.current();
        let irq = IntrGuard::disable(self.intr);
        let wake_tick = {
            let mut queue = self.queue.lock(self.intr);
            // Saturates: a wake tick past the counter's range is never reached.
            let wake_tick = self.ticks.load(Ordering::Acquire).saturating_add(ticks);
            queue.register(SleepRequest::new(pid, wake_tick));
            wake_tick
        };
        // on_tick removes the request before unblocking us.
        self.threads.block_current();
        drop(irq);

        log_trace!(target: "timer", "pid={} resumed (wake_tick={})", pid, wake_tick);
    }

    /// Sleeps for about `ms` milliseconds.
    pub fn sleep_milliseconds(&self, ms: i64) {
        self.real_time_sleep(ms, MS_PER_S);
    }

    /// Sleeps for about `us` microseconds.
    pub fn sleep_microseconds(&self, us: i64) {
        self.real_time_sleep(us, US_PER_S);
    }

    /// Sleeps for about `ns` nanoseconds.
    pub fn sleep_nanoseconds(&self, ns: i64) {
        self.real_time_sleep(ns, NS_PER_S);
    }

    /// Busy-waits for about `ms` milliseconds. Interrupts may be off.
    ///
    /// Spinning with interrupts off for a tick or longer loses ticks; prefer
    /// [`Self::sleep_milliseconds`] when interrupts are on.
    pub fn delay_milliseconds(&self, ms: i64) {
        self.real_time_delay(ms, MS_PER_S);
    }

    /// Busy-waits for about `us` microseconds. Interrupts may be off.
    pub fn delay_microseconds(&self, us: i64) {
        self.real_time_delay(us, US_PER_S);
    }

    /// Busy-waits for about `ns` nanoseconds. Interrupts may be off.
    pub fn delay_nanoseconds(&self, ns: i64) {
        self.real_time_delay(ns, NS_PER_S);
    }

    /// Sleeps for `num / denom` seconds, falling back to a busy wait when
    /// the duration rounds down to zero ticks.
    fn real_time_sleep(&self, num: i64, denom: i32) {
        let ticks = self.config.ticks_for(num, denom);
        assert!(self.intr.level().is_on(), "sleep: interrupts must be on");
        if ticks > 0 {
            self.sleep(ticks);
        } else {
            self.real_time_delay(num, denom);
        }
    }

    /// Busy-waits for `num / denom` seconds.
    fn real_time_delay(&self, num: i64, denom: i32) {
        // Scale both sides down by 1000 to keep the product in range.
        assert!(denom % 1000 == 0, "delay: denominator must be a multiple of 1000");
        let loops_per_tick = i128::from(self.loops_per_tick.load(Ordering::Relaxed));
        let freq = i128::from(self.config.freq_hz());
        let loops = loops_per_tick * i128::from(num) / 1000 * freq / i128::from(denom / 1000);
        self.delay.busy_wait(saturate_tick(loops));
    }

    /// Busy-loop iterations per tick.
    pub fn loops_per_tick(&self) -> u32 {
        self.loops_per_tick.load(Ordering::Relaxed)
    }

    /// Installs a loops-per-tick value measured elsewhere.
    pub fn set_loops_per_tick(&self, loops: u32) {
        self.loops_per_tick.store(loops, Ordering::Relaxed);
    }

    /// Calibrates the busy loop against the live tick interrupt.
    pub fn calibrate(&self) -> u32 {
        let mut probe = TickEdgeProbe::new(self);
        self.calibrate_with(&mut probe)
    }

    /// Calibrates the busy loop with an explicit probe.
    pub fn calibrate_with(&self, probe: &mut impl TickProbe) -> u32 {
        assert!(self.intr.level().is_on(), "calibrate: interrupts must be on");
        log_info!(target: "timer", "Calibrating timer...");
        let loops = calibrate::calibrate(probe);
        self.set_loops_per_tick(loops);
        log_info!(
            target: "timer",
            "{} loops/s",
            u64::from(loops) * u64::from(self.config.freq_hz())
        );
        loops
    }

    /// Logs the tick count.
    pub fn print_stats(&self) {
        log_info!(target: "timer", "Timer: {} ticks", self.ticks());
    }

    /// Raw counter read for calibration, which must not perturb interrupts.
    pub(crate) fn tick_snapshot(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }

    pub(crate) fn delay_loop(&self) -> &dyn DelayLoop {
        self.delay
    }
}
