// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Timer-driven sleep/wake and parent/child exit-status handoff
//! OWNERS: @kernel-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit + proptest per module; host thread integration tests under tests/
//! PUBLIC API: sched::SleepTimer, process::ProcessTable, syscall::{SyscallTable, api}
//! DEPENDS_ON: spin, static_assertions, riscv (riscv64 bare-metal only)
//! INVARIANTS: Tick handler never blocks, allocates or logs; shared state is touched with interrupts off
//!
//! Hardware is reached through the traits in [`hal`]; the riscv backend lives
//! in [`arch`] and host tests plug in [`hal::soft`].

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]

extern crate alloc;

#[macro_use]
pub mod log;

pub mod arch;
pub mod config;
pub mod hal;
pub mod process;
pub mod sched;
pub mod sync;
pub mod syscall;
pub mod types;

pub use config::{TimerConfig, TIMER_FREQ};
pub use process::{ExitRecord, ExitStatus, ProcessTable};
pub use sched::SleepTimer;
pub use types::{IntrLevel, Pid, Tick};
