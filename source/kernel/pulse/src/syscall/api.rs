// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Syscall handlers exposed to the dispatcher
//! OWNERS: @kernel-team
//! PUBLIC API: install_handlers(table), Context
//! DEPENDS_ON: process::ProcessTable
//! INVARIANTS: Stable syscall IDs; exit never returns to the caller

use crate::process::ProcessTable;
use crate::types::Pid;

use super::{Args, Error, SysResult, SyscallTable, SYSCALL_EXIT, SYSCALL_GETPID, SYSCALL_WAIT};

/// Kernel state visible to a handler.
pub struct Context<'a> {
    pub processes: &'a mut ProcessTable,
    /// Exit status of the child returned by the last successful `wait` (a1 on return).
    pub wait_status: Option<i32>,
}

impl<'a> Context<'a> {
    /// Creates a new context for the current task.
    pub fn new(processes: &'a mut ProcessTable) -> Self {
        Self { processes, wait_status: None }
    }
}

/// Installs the default handler set.
pub fn install_handlers(table: &mut SyscallTable) {
    table.register(SYSCALL_EXIT, sys_exit);
    table.register(SYSCALL_WAIT, sys_wait);
    table.register(SYSCALL_GETPID, sys_getpid);
}

fn sys_exit(ctx: &mut Context<'_>, args: &Args) -> SysResult<usize> {
    let status = args.get(0) as i32;
    let pid = ctx.processes.current_pid();
    log_info!(target: "syscall", "{}: exit({})", ctx.processes.name_of(pid), status);
    let outcome = ctx.processes.exit_current(status);
    log_debug!(target: "syscall", "exit pid={} -> {:?}", pid, outcome);
    Err(Error::TaskExit)
}

fn sys_wait(ctx: &mut Context<'_>, args: &Args) -> SysResult<usize> {
    let raw_pid = args.get(0) as i32;
    let target = if raw_pid <= 0 { None } else { Some(Pid::from_raw(raw_pid as u32)) };
    let parent = ctx.processes.current_pid();
    match ctx.processes.wait_nonblocking(parent, target) {
        Ok((pid, status)) => {
            ctx.wait_status = Some(status);
            Ok(pid.as_index())
        }
        Err(err) => Err(Error::from(err)),
    }
}

fn sys_getpid(ctx: &mut Context<'_>, _args: &Args) -> SysResult<usize> {
    Ok(ctx.processes.current_pid().as_index())
}
