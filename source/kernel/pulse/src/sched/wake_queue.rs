// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Wake queue of sleeping threads ordered by absolute wake tick
//! OWNERS: @kernel-sched-team
//! PUBLIC API: WakeQueue (new/register/on_tick/peek/len), SleepRequest
//! DEPENDS_ON: types::{Pid, Tick}
//! INVARIANTS: Always sorted ascending by wake tick; FIFO among equal ticks; scan stops at first future entry

extern crate alloc;

use alloc::collections::VecDeque;

use crate::types::{Pid, Tick};

/// Initial queue capacity; the queue grows past it if needed.
const WAKE_QUEUE_CAPACITY: usize = 64;

/// A thread's registered intent to resume at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    wake_tick: Tick,
    pid: Pid,
}

impl SleepRequest {
    pub const fn new(pid: Pid, wake_tick: Tick) -> Self {
        Self { wake_tick, pid }
    }

    pub const fn wake_tick(&self) -> Tick {
        self.wake_tick
    }

    pub const fn pid(&self) -> Pid {
        self.pid
    }
}

/// Returns true when a request for `wake_tick` must be resumed at `now`.
#[inline]
pub(crate) const fn is_due(wake_tick: Tick, now: Tick) -> bool {
    #[cfg(feature = "exact_wake_match")]
    {
        wake_tick == now
    }
    #[cfg(not(feature = "exact_wake_match"))]
    {
        wake_tick <= now
    }
}

/// Pending sleep requests, earliest wake tick first.
///
/// Mutated from thread context (`register`) and from the tick handler
/// (`on_tick`); callers hold it behind an `IrqLock`.
pub struct WakeQueue {
    entries: VecDeque<SleepRequest>,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self { entries: VecDeque::with_capacity(WAKE_QUEUE_CAPACITY) }
    }

    /// Inserts `request` after every entry with a wake tick at or before its own.
    pub fn register(&mut self, request: SleepRequest) {
        let at = self.entries.partition_point(|e| e.wake_tick <= request.wake_tick);
        self.entries.insert(at, request);
        debug_assert!(self.is_sorted());
    }

    /// Removes every request due at `now`, in queue order, handing each
    /// owner to `wake`. Returns the number of requests removed.
    ///
    /// Runs in interrupt context: no allocation, bounded by the number of
    /// requests due this tick.
    pub fn on_tick(&mut self, now: Tick, mut wake: impl FnMut(Pid)) -> usize {
        let mut woken = 0;
        while let Some(&front) = self.entries.front() {
            if !is_due(front.wake_tick, now) {
                break;
            }
            self.entries.pop_front();
            wake(front.pid);
            woken += 1;
        }
        woken
    }

    /// Earliest pending request.
    pub fn peek(&self) -> Option<&SleepRequest> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SleepRequest> {
        self.entries.iter()
    }

    /// Checks the ordering invariant.
    pub fn is_sorted(&self) -> bool {
        self.entries.iter().zip(self.entries.iter().skip(1)).all(|(a, b)| a.wake_tick <= b.wake_tick)
    }
}

impl Default for WakeQueue {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(WakeQueue: Send);
