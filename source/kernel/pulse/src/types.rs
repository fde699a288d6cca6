// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Identity and time newtypes shared by the timer and process code
//! OWNERS: @kernel-team
//! PUBLIC API: Pid, Tick, IntrLevel
//! DEPENDS_ON: core only
//! INVARIANTS: Pid 0 is the initial thread; ticks are signed so callers may pass non-positive durations
//!
//! ## Newtype Rationale
//!
//! - `Pid` keeps thread identity distinct from table indices and raw syscall words
//! - `Tick` stays a plain signed integer: durations may legally be zero or negative

use core::fmt;

/// Absolute tick count or tick duration.
pub type Tick = i64;

/// Thread/process identifier.
///
/// **Ownership**: Only `ProcessTable` hands out new PIDs.
/// **Invariant**: PID 0 is the initial thread and never has a parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Pid(u32);

impl Pid {
    /// Creates a PID from a raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw PID value.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the PID as an index into task-owned vectors.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    /// The initial thread created at boot.
    pub const INIT: Self = Self(0);
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

impl From<u32> for Pid {
    #[inline]
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Pid> for usize {
    #[inline]
    fn from(pid: Pid) -> Self {
        pid.as_index()
    }
}

/// Interrupt enable state of the executing CPU.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntrLevel {
    Off,
    On,
}

impl IntrLevel {
    #[inline]
    pub const fn is_on(self) -> bool {
        matches!(self, IntrLevel::On)
    }
}
