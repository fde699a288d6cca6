// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Software interrupt model for host builds.
//!
//! Tracks the interrupt level and handler nesting in atomics so the timer
//! can run (and enforce its preconditions) on a host with no interrupt
//! hardware. The state is CPU-wide: one `SoftInterrupts` models one core.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::Interrupts;
use crate::types::IntrLevel;

pub struct SoftInterrupts {
    enabled: AtomicBool,
    handler_depth: AtomicUsize,
}

impl SoftInterrupts {
    /// Creates a model with interrupts enabled and no handler running.
    pub const fn new() -> Self {
        Self { enabled: AtomicBool::new(true), handler_depth: AtomicUsize::new(0) }
    }

    /// Runs `f` the way an external interrupt handler would: interrupts off
    /// and `in_interrupt_context()` true for the duration.
    pub fn run_handler<R>(&self, f: impl FnOnce() -> R) -> R {
        let old = self.set_level(IntrLevel::Off);
        self.handler_depth.fetch_add(1, Ordering::SeqCst);
        let out = f();
        self.handler_depth.fetch_sub(1, Ordering::SeqCst);
        self.set_level(old);
        out
    }
}

impl Default for SoftInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupts for SoftInterrupts {
    fn level(&self) -> IntrLevel {
        if self.enabled.load(Ordering::SeqCst) {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    fn set_level(&self, level: IntrLevel) -> IntrLevel {
        let was_on = self.enabled.swap(level.is_on(), Ordering::SeqCst);
        if was_on {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    fn in_interrupt_context(&self) -> bool {
        self.handler_depth.load(Ordering::SeqCst) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_level_returns_previous() {
        let intr = SoftInterrupts::new();
        assert_eq!(intr.disable(), IntrLevel::On);
        assert_eq!(intr.level(), IntrLevel::Off);
        assert_eq!(intr.set_level(IntrLevel::On), IntrLevel::Off);
    }

    #[test]
    fn handler_runs_with_interrupts_off() {
        let intr = SoftInterrupts::new();
        let seen = intr.run_handler(|| (intr.level(), intr.in_interrupt_context()));
        assert_eq!(seen, (IntrLevel::Off, true));
        assert_eq!(intr.level(), IntrLevel::On);
        assert!(!intr.in_interrupt_context());
    }
}
