// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for the wake queue
//! OWNERS: @kernel-sched-team
//! NOTE: Tests only; no kernel logic.
//!
//! TEST_SCENARIOS:
//!   - stays_sorted_after_every_register(): ordering holds for arbitrary insert orders
//!   - equal_ticks_keep_registration_order(): FIFO among equal wake ticks
//!   - every_request_wakes_once_on_time(): interleaved sleeps and ticks wake each pid exactly once at its tick

use std::collections::BTreeMap;
use std::vec::Vec;

use proptest::prelude::*;

use super::wake_queue::{SleepRequest, WakeQueue};
use crate::types::{Pid, Tick};

#[derive(Debug, Clone, Copy)]
enum Op {
    Sleep(Tick),
    Tick,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![(1i64..20).prop_map(Op::Sleep), Just(Op::Tick)]
}

proptest! {
    #[test]
    fn stays_sorted_after_every_register(ticks in proptest::collection::vec(-50i64..50, 0..64)) {
        let mut q = WakeQueue::new();
        for (raw, tick) in ticks.iter().enumerate() {
            q.register(SleepRequest::new(Pid::from_raw(raw as u32), *tick));
            prop_assert!(q.is_sorted());
        }
        prop_assert_eq!(q.len(), ticks.len());
    }

    #[test]
    fn equal_ticks_keep_registration_order(ticks in proptest::collection::vec(0i64..4, 1..48)) {
        let mut q = WakeQueue::new();
        for (raw, tick) in ticks.iter().enumerate() {
            q.register(SleepRequest::new(Pid::from_raw(raw as u32), *tick));
        }
        let order: Vec<(Tick, u32)> = q.iter().map(|r| (r.wake_tick(), r.pid().as_raw())).collect();
        let mut expected = order.clone();
        expected.sort();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn every_request_wakes_once_on_time(ops in proptest::collection::vec(arb_op(), 0..128)) {
        let mut q = WakeQueue::new();
        let mut now: Tick = 0;
        let mut next_pid = 0u32;
        let mut due: BTreeMap<u32, Tick> = BTreeMap::new();
        let mut woken: BTreeMap<u32, Tick> = BTreeMap::new();

        for op in ops.into_iter().chain(core::iter::repeat(Op::Tick).take(20)) {
            match op {
                Op::Sleep(len) => {
                    q.register(SleepRequest::new(Pid::from_raw(next_pid), now + len));
                    due.insert(next_pid, now + len);
                    next_pid += 1;
                }
                Op::Tick => {
                    now += 1;
                    let mut seen = Vec::new();
                    q.on_tick(now, |pid| seen.push(pid.as_raw()));
                    for raw in seen {
                        prop_assert!(woken.insert(raw, now).is_none());
                    }
                }
            }
        }

        prop_assert!(q.is_empty());
        prop_assert_eq!(woken, due);
    }
}
