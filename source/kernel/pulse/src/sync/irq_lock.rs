// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use core::ops::{Deref, DerefMut};

use crate::hal::Interrupts;
use crate::types::IntrLevel;

/// Disables interrupts for its lifetime and restores the previous level on drop.
///
/// Guards nest: only the outermost one turns interrupts back on.
pub struct IntrGuard<'a> {
    intr: &'a dyn Interrupts,
    old: IntrLevel,
}

impl<'a> IntrGuard<'a> {
    pub fn disable(intr: &'a dyn Interrupts) -> Self {
        let old = intr.disable();
        Self { intr, old }
    }

    /// Level that will be restored when the guard drops.
    pub fn previous(&self) -> IntrLevel {
        self.old
    }
}

impl Drop for IntrGuard<'_> {
    fn drop(&mut self) {
        self.intr.set_level(self.old);
    }
}

/// Spin lock that is only ever held with interrupts disabled.
///
/// On a single core the disabled interrupts are what keep the tick handler
/// out; the spin lock adds exclusion when the same structure is reached from
/// several host threads.
pub struct IrqLock<T> {
    inner: spin::Mutex<T>,
}

impl<T> IrqLock<T> {
    pub const fn new(value: T) -> Self {
        Self { inner: spin::Mutex::new(value) }
    }

    /// Disables interrupts, then takes the lock.
    pub fn lock<'a>(&'a self, intr: &'a dyn Interrupts) -> IrqLockGuard<'a, T> {
        let irq = IntrGuard::disable(intr);
        let guard = self.inner.lock();
        IrqLockGuard { guard, _irq: irq }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for IrqLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub struct IrqLockGuard<'a, T> {
    // Field order matters: the spin guard drops before interrupts come back on.
    guard: spin::MutexGuard<'a, T>,
    _irq: IntrGuard<'a>,
}

impl<T> Deref for IrqLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> DerefMut for IrqLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
