// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Busy-loop calibration against the tick counter.
//!
//! `loops_per_tick` starts as the largest power of two (from 2^10 up) that
//! still fits inside one tick. Each of the next nine lower bits is then
//! probed on its own against that power of two and kept if it still fits.

use core::sync::atomic::{compiler_fence, Ordering};

use super::timer::SleepTimer;

const INITIAL_LOOPS: u32 = 1 << 10;
const REFINE_STOP_SHIFT: u32 = 10;

/// Answers whether running `loops` busy iterations spans a tick boundary.
pub trait TickProbe {
    fn too_many_loops(&mut self, loops: u32) -> bool;
}

/// Computes loops-per-tick using `probe`.
pub fn calibrate(probe: &mut impl TickProbe) -> u32 {
    let mut loops_per_tick = INITIAL_LOOPS;
    while !probe.too_many_loops(loops_per_tick << 1) {
        loops_per_tick <<= 1;
        assert!(loops_per_tick != 0, "calibrate: loops_per_tick overflowed");
    }

    let high_bit = loops_per_tick;
    let mut test_bit = high_bit >> 1;
    while test_bit != high_bit >> REFINE_STOP_SHIFT {
        if !probe.too_many_loops(high_bit | test_bit) {
            loops_per_tick |= test_bit;
        }
        test_bit >>= 1;
    }
    loops_per_tick
}

/// Probe that measures against the live tick counter.
///
/// Needs the tick interrupt running: it first waits for a tick edge, then
/// checks whether the counter moved while `loops` iterations ran.
pub struct TickEdgeProbe<'t, 'hw> {
    timer: &'t SleepTimer<'hw>,
}

impl<'t, 'hw> TickEdgeProbe<'t, 'hw> {
    pub fn new(timer: &'t SleepTimer<'hw>) -> Self {
        Self { timer }
    }
}

impl TickProbe for TickEdgeProbe<'_, '_> {
    fn too_many_loops(&mut self, loops: u32) -> bool {
        let start = self.timer.tick_snapshot();
        while self.timer.tick_snapshot() == start {
            core::hint::spin_loop();
        }

        let start = self.timer.tick_snapshot();
        self.timer.delay_loop().busy_wait(i64::from(loops));
        compiler_fence(Ordering::SeqCst);
        start != self.timer.tick_snapshot()
    }
}
