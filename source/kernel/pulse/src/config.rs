// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Timer frequency knobs and tick conversion
//! OWNERS: @kernel-team
//! PUBLIC API: TIMER_FREQ, TimerConfig (new/freq_hz/ticks_for), ConfigError
//! DEPENDS_ON: static_assertions
//! INVARIANTS: 19 <= freq <= 1000 Hz; conversions round toward zero
//!
//! The tick source is programmed elsewhere; this module only records the
//! frequency it was programmed with so durations can be turned into ticks.

use static_assertions::const_assert;

use crate::types::Tick;

/// Lowest frequency the 8254 channel can be divided down to.
pub const MIN_TIMER_FREQ: u32 = 19;
/// Highest recommended tick rate.
pub const MAX_TIMER_FREQ: u32 = 1000;
/// Default ticks per second.
pub const TIMER_FREQ: u32 = 100;

const_assert!(TIMER_FREQ >= MIN_TIMER_FREQ);
const_assert!(TIMER_FREQ <= MAX_TIMER_FREQ);

/// Rejected frequency values.
#[must_use = "config errors must be handled"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    FrequencyTooLow { freq_hz: u32 },
    FrequencyTooHigh { freq_hz: u32 },
}

/// Validated timer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    freq_hz: u32,
}

impl TimerConfig {
    /// Validates `freq_hz` against the supported range.
    pub const fn new(freq_hz: u32) -> Result<Self, ConfigError> {
        if freq_hz < MIN_TIMER_FREQ {
            return Err(ConfigError::FrequencyTooLow { freq_hz });
        }
        if freq_hz > MAX_TIMER_FREQ {
            return Err(ConfigError::FrequencyTooHigh { freq_hz });
        }
        Ok(Self { freq_hz })
    }

    /// Ticks per second.
    #[inline]
    pub const fn freq_hz(self) -> u32 {
        self.freq_hz
    }

    /// Converts `num / denom` seconds into ticks, rounding toward zero.
    ///
    /// `(num / denom) s / (1 s / freq ticks) = num * freq / denom ticks`
    ///
    /// Results past the `Tick` range saturate.
    #[inline]
    pub const fn ticks_for(self, num: i64, denom: i32) -> Tick {
        saturate_tick(num as i128 * self.freq_hz as i128 / denom as i128)
    }
}

/// Clamps a widened intermediate back into the `Tick` range.
#[inline]
pub(crate) const fn saturate_tick(wide: i128) -> Tick {
    if wide > Tick::MAX as i128 {
        Tick::MAX
    } else if wide < Tick::MIN as i128 {
        Tick::MIN
    } else {
        wide as Tick
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { freq_hz: TIMER_FREQ }
    }
}
