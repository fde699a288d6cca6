// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Interrupt-disciplined synchronization for state shared with the tick handler
//! OWNERS: @kernel-sync-team
//! PUBLIC API: IntrGuard::disable(), IrqLock::new(), IrqLock::lock()
//! DEPENDS_ON: spin::Mutex, hal::Interrupts
//! INVARIANTS: Interrupts are off before the spin lock is taken and restored only after it is released

mod irq_lock;

pub use irq_lock::{IntrGuard, IrqLock, IrqLockGuard};
