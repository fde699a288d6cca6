// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Process table and parent/child exit-status handoff
//! OWNERS: @kernel-sched-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests below + tests_prop.rs + tests/exit_status.rs (real host threads)
//! PUBLIC API: ProcessTable (spawn/exit/record_exit_status/child_status/wait_nonblocking), ExitStatus, ExitRecord
//! DEPENDS_ON: types::Pid
//! INVARIANTS: A child record is appended when the child is created and never removed while the
//!             parent lives; its status goes Pending -> Exited exactly once and only through the
//!             child's own exit. Callers keep the table behind an IrqLock so readers observe the write.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

pub use crate::types::Pid;

#[cfg(test)]
mod tests_prop;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Exited,
}

/// Status carried by a child record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Child has not exited yet.
    Pending,
    /// Child exited with this code.
    Exited(i32),
}

impl ExitStatus {
    pub const fn code(self) -> Option<i32> {
        match self {
            ExitStatus::Pending => None,
            ExitStatus::Exited(code) => Some(code),
        }
    }
}

/// One child's slot in its parent's child table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRecord {
    child: Pid,
    status: ExitStatus,
}

impl ChildRecord {
    const fn pending(child: Pid) -> Self {
        Self { child, status: ExitStatus::Pending }
    }

    pub const fn child(&self) -> Pid {
        self.child
    }

    pub const fn status(&self) -> ExitStatus {
        self.status
    }
}

/// What happened when a terminating task tried to hand its status to its parent.
///
/// Every variant is a normal outcome; none of them is an error.
#[must_use = "exit outcomes should be inspected or explicitly ignored"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRecord {
    /// Status written into the parent's record.
    Recorded,
    /// Task has no parent; nothing to write.
    NoParent,
    /// Parent exists but holds no record for this task.
    NotListed,
    /// Record already carries a status; left untouched.
    AlreadyRecorded,
}

/// Error returned when spawning a new task.
#[must_use = "spawn errors must be handled explicitly"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// Parent PID does not exist.
    InvalidParent,
    /// Every PID value is already in use.
    PidExhausted,
}

/// Errors returned when inspecting child processes.
#[must_use = "wait errors must be handled explicitly"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// Task has no children.
    NoChildren,
    /// Requested PID is not a child of the task.
    NoSuchPid,
    /// Wait argument is not valid (for example, waiting on self).
    InvalidTarget,
    /// Target child exists but has not exited yet.
    WouldBlock,
}

/// Minimal task control block.
#[derive(Debug, Clone)]
pub struct Task {
    pid: Pid,
    name: String,
    parent: Option<Pid>,
    state: TaskState,
    children: Vec<ChildRecord>,
}

impl Task {
    fn new(pid: Pid, name: &str, parent: Option<Pid>) -> Self {
        Self { pid, name: String::from(name), parent, state: TaskState::Running, children: Vec::new() }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the child table in creation order.
    pub fn children(&self) -> &[ChildRecord] {
        &self.children
    }

    fn record_mut(&mut self, child: Pid) -> Option<&mut ChildRecord> {
        self.children.iter_mut().find(|record| record.child == child)
    }
}

/// PID of the task stored at table index `slot`.
fn pid_for_slot(slot: usize) -> Result<Pid, SpawnError> {
    u32::try_from(slot).map(Pid::from_raw).map_err(|_| SpawnError::PidExhausted)
}

/// Kernel process table. Index `n` holds the task with PID `n`.
pub struct ProcessTable {
    tasks: Vec<Task>,
    current: Pid,
}

impl ProcessTable {
    /// Creates a new table seeded with the initial thread (PID 0, "main").
    pub fn new() -> Self {
        let mut tasks = Vec::new();
        tasks.push(Task::new(Pid::INIT, "main", None));
        Self { tasks, current: Pid::INIT }
    }

    /// Returns the PID of the currently running task.
    pub fn current_pid(&self) -> Pid {
        self.current
    }

    /// Changes the currently running task.
    pub fn set_current(&mut self, pid: Pid) {
        self.current = pid;
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, pid: Pid) -> Option<&Task> {
        self.tasks.get(pid.as_index())
    }

    fn task_mut(&mut self, pid: Pid) -> Option<&mut Task> {
        self.tasks.get_mut(pid.as_index())
    }

    /// Name of `pid`, or `"?"` for an unknown task.
    pub fn name_of(&self, pid: Pid) -> &str {
        self.task(pid).map_or("?", Task::name)
    }

    /// Creates a task under `parent` and appends a pending record for it to
    /// the parent's child table.
    pub fn spawn(&mut self, parent: Pid, name: &str) -> Result<Pid, SpawnError> {
        if self.task(parent).is_none() {
            return Err(SpawnError::InvalidParent);
        }
        let pid = pid_for_slot(self.tasks.len())?;
        self.tasks.push(Task::new(pid, name, Some(parent)));
        if let Some(parent_task) = self.task_mut(parent) {
            parent_task.children.push(ChildRecord::pending(pid));
        }
        log_debug!(target: "process", "spawn pid={} parent={} name={}", pid, parent, name);
        Ok(pid)
    }

    /// Writes `status` into the parent's record for `child`.
    ///
    /// Write-once: a record that already holds a status is never overwritten.
    pub fn record_exit_status(&mut self, child: Pid, status: i32) -> ExitRecord {
        let Some(parent) = self.task(child).and_then(Task::parent) else {
            return ExitRecord::NoParent;
        };
        let Some(parent_task) = self.task_mut(parent) else {
            return ExitRecord::NoParent;
        };
        let Some(record) = parent_task.record_mut(child) else {
            return ExitRecord::NotListed;
        };
        match record.status {
            ExitStatus::Pending => {
                record.status = ExitStatus::Exited(status);
                ExitRecord::Recorded
            }
            ExitStatus::Exited(previous) => {
                log_warn!(
                    target: "process",
                    "pid={} exit({}) ignored: status {} already recorded",
                    child,
                    status,
                    previous
                );
                ExitRecord::AlreadyRecorded
            }
        }
    }

    /// Terminates `pid` with `status` and hands the status to its parent.
    pub fn exit(&mut self, pid: Pid, status: i32) -> ExitRecord {
        if let Some(task) = self.task_mut(pid) {
            task.state = TaskState::Exited;
        }
        self.record_exit_status(pid, status)
    }

    /// Terminates the current task.
    pub fn exit_current(&mut self, status: i32) -> ExitRecord {
        self.exit(self.current, status)
    }

    /// Reads `parent`'s record for `child`.
    pub fn child_status(&self, parent: Pid, child: Pid) -> Result<ExitStatus, WaitError> {
        let parent_task = self.task(parent).ok_or(WaitError::NoChildren)?;
        if parent_task.children.is_empty() {
            return Err(WaitError::NoChildren);
        }
        parent_task
            .children
            .iter()
            .find(|record| record.child == child)
            .map(ChildRecord::status)
            .ok_or(WaitError::NoSuchPid)
    }

    /// Returns an exited child of `parent` and its status without blocking.
    ///
    /// With no `target`, the earliest-created exited child is chosen. Records
    /// are not consumed.
    pub fn wait_nonblocking(
        &self,
        parent: Pid,
        target: Option<Pid>,
    ) -> Result<(Pid, i32), WaitError> {
        let parent_task = self.task(parent).ok_or(WaitError::NoChildren)?;
        if parent_task.children.is_empty() {
            return Err(WaitError::NoChildren);
        }

        match target {
            Some(pid) if pid == parent => Err(WaitError::InvalidTarget),
            Some(pid) => {
                let record = parent_task
                    .children
                    .iter()
                    .find(|record| record.child == pid)
                    .ok_or(WaitError::NoSuchPid)?;
                let code = record.status.code().ok_or(WaitError::WouldBlock)?;
                Ok((pid, code))
            }
            None => parent_task
                .children
                .iter()
                .find_map(|record| record.status.code().map(|code| (record.child, code)))
                .ok_or(WaitError::WouldBlock),
        }
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(ProcessTable: Send);
