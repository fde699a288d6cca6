// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Tick-driven sleep/wake scheduling
//! OWNERS: @kernel-sched-team
//! PUBLIC API: SleepTimer, WakeQueue, SleepRequest, calibrate(), TickProbe, TickEdgeProbe
//! DEPENDS_ON: hal (interrupts, threads, delay loop), sync::IrqLock, config::TimerConfig
//! INVARIANTS: Wake queue sorted by wake tick; a sleeper resumes on the first tick >= its wake tick
//!
//! Threads block in [`SleepTimer::sleep`] until the tick handler
//! ([`SleepTimer::on_tick`]) reaches their wake tick. Sub-tick durations
//! fall back to a calibrated busy loop.

pub mod calibrate;
pub mod timer;
pub mod wake_queue;

#[cfg(test)]
mod tests_prop;

pub use calibrate::{calibrate, TickEdgeProbe, TickProbe};
pub use timer::SleepTimer;
pub use wake_queue::{SleepRequest, WakeQueue};
