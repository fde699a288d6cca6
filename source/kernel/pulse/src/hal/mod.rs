// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits the timer and process code are written against.

pub mod soft;

use crate::types::{IntrLevel, Pid};

/// Interrupt enable/disable control for the executing CPU.
pub trait Interrupts: Sync {
    /// Returns the current interrupt level.
    fn level(&self) -> IntrLevel;
    /// Sets the interrupt level and returns the previous one.
    fn set_level(&self, level: IntrLevel) -> IntrLevel;
    /// Returns true while an external interrupt handler is running.
    fn in_interrupt_context(&self) -> bool;

    /// Disables interrupts and returns the previous level.
    fn disable(&self) -> IntrLevel {
        self.set_level(IntrLevel::Off)
    }
}

/// Scheduler block/unblock primitives.
pub trait Threads: Sync {
    /// Identity of the running thread.
    fn current(&self) -> Pid;
    /// Blocks the running thread until `unblock` is called for it.
    ///
    /// Must be called with interrupts off. Returns once the thread has been
    /// unblocked and scheduled again.
    fn block_current(&self);
    /// Makes `pid` runnable again. Safe to call from interrupt context.
    fn unblock(&self, pid: Pid);
}

/// Calibrated busy loop used for sub-tick delays.
pub trait DelayLoop: Sync {
    fn busy_wait(&self, loops: i64);
}

/// Default delay loop: a non-inlined loop of compiler barriers.
///
/// Kept out of line so every caller spins with the same code alignment,
/// which is what the calibrated `loops_per_tick` was measured against.
pub struct SpinDelay;

impl DelayLoop for SpinDelay {
    #[inline(never)]
    fn busy_wait(&self, mut loops: i64) {
        while loops > 0 {
            core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
            loops -= 1;
        }
    }
}
