// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! RISC-V supervisor-mode interrupt control.
//!
//! The interrupt level maps onto `sstatus.SIE`. Trap entry glue brackets the
//! handler with [`enter_trap`]/[`leave_trap`] so `in_interrupt_context()` can
//! tell the tick handler apart from thread context.

use core::sync::atomic::{AtomicUsize, Ordering};

use riscv::register::sstatus;

use crate::hal::Interrupts;
use crate::types::IntrLevel;

static TRAP_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// Marks entry into an external interrupt handler.
#[inline]
pub fn enter_trap() {
    TRAP_DEPTH.fetch_add(1, Ordering::Relaxed);
}

/// Marks exit from an external interrupt handler.
#[inline]
pub fn leave_trap() {
    TRAP_DEPTH.fetch_sub(1, Ordering::Relaxed);
}

/// `sstatus.SIE` backed interrupt control for the boot hart.
pub struct RiscvInterrupts;

impl Interrupts for RiscvInterrupts {
    #[inline]
    fn level(&self) -> IntrLevel {
        if sstatus::read().sie() {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    #[inline]
    fn set_level(&self, level: IntrLevel) -> IntrLevel {
        let old = self.level();
        // SAFETY: toggling SIE only masks/unmasks supervisor interrupts on this hart;
        // the trap vector is installed before the first tick is armed.
        unsafe {
            match level {
                IntrLevel::On => sstatus::set_sie(),
                IntrLevel::Off => sstatus::clear_sie(),
            }
        }
        old
    }

    #[inline]
    fn in_interrupt_context(&self) -> bool {
        TRAP_DEPTH.load(Ordering::Relaxed) > 0
    }
}
