// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for the exit-status handoff
//! OWNERS: @kernel-sched-team
//! NOTE: Tests only; no kernel logic.
//!
//! TEST_SCENARIOS:
//!   - first_exit_wins(): whatever order exits arrive in, each record keeps its first status
//!   - records_never_removed(): child tables only grow

use std::collections::BTreeMap;
use std::vec::Vec;

use proptest::prelude::*;

use super::{ExitRecord, ExitStatus, ProcessTable};
use crate::types::Pid;

proptest! {
    #[test]
    fn first_exit_wins(children in 1usize..8, exits in proptest::collection::vec((0usize..8, any::<i32>()), 0..32)) {
        let mut table = ProcessTable::new();
        let pids: Vec<Pid> = (0..children).map(|_| table.spawn(Pid::INIT, "child").unwrap()).collect();
        let mut first: BTreeMap<u32, i32> = BTreeMap::new();

        for (which, status) in exits {
            let pid = pids[which % children];
            let outcome = table.exit(pid, status);
            if first.contains_key(&pid.as_raw()) {
                prop_assert_eq!(outcome, ExitRecord::AlreadyRecorded);
            } else {
                prop_assert_eq!(outcome, ExitRecord::Recorded);
                first.insert(pid.as_raw(), status);
            }
        }

        for pid in &pids {
            let expected = first.get(&pid.as_raw()).map_or(ExitStatus::Pending, |code| ExitStatus::Exited(*code));
            prop_assert_eq!(table.child_status(Pid::INIT, *pid), Ok(expected));
        }
    }

    #[test]
    fn records_never_removed(ops in proptest::collection::vec(any::<bool>(), 0..32)) {
        let mut table = ProcessTable::new();
        let mut spawned = Vec::new();
        for spawn in ops {
            if spawn || spawned.is_empty() {
                spawned.push(table.spawn(Pid::INIT, "child").unwrap());
            } else {
                let pid = spawned[spawned.len() / 2];
                let _ = table.exit(pid, 1);
            }
            let len = table.task(Pid::INIT).map_or(0, |t| t.children().len());
            prop_assert_eq!(len, spawned.len());
        }
    }
}
