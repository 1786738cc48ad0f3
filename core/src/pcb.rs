//! The process control block: one per task, holding everything the
//! scheduler and process syscalls need to track its lifecycle.
//!
//! Grounded in `original_source/src/util/PCB.h`/`kernel.c: k_proc_create`.

use std::collections::VecDeque;

use pennos_abi::{JobId, Pid, ProcessStatus, Signal, PRIORITY_MEDIUM};
use pennos_fs::FdTable;

pub struct Pcb {
    pub pid: Pid,
    pub ppid: Pid,
    pub priority: i32,
    pub status: ProcessStatus,
    pub command: String,
    pub job_id: Option<JobId>,
    pub is_background: bool,
    /// Live children, in spawn order.
    pub children: Vec<Pid>,
    /// Children that changed state (finished/terminated/stopped/continued)
    /// since this process's last `waitpid`, in the order they changed.
    pub status_changes: VecDeque<Pid>,
    /// True while this process is blocked inside a `waitpid` call.
    pub blocking: bool,
    /// Remaining sleep ticks (`k_sleep`/`k_sleep_check`), `0` when awake.
    pub sleep_ticks: u32,
    pub fd_table: FdTable,
    pub exit_status: Option<i32>,
    pub last_signal: Option<Signal>,
}

impl Pcb {
    pub fn new(pid: Pid, ppid: Pid, command: impl Into<String>, is_background: bool) -> Self {
        Self {
            pid,
            ppid,
            priority: PRIORITY_MEDIUM,
            status: ProcessStatus::Running,
            command: command.into(),
            job_id: None,
            is_background,
            children: Vec::new(),
            status_changes: VecDeque::new(),
            blocking: false,
            sleep_ticks: 0,
            fd_table: FdTable::new(),
            exit_status: None,
            last_signal: None,
        }
    }

    /// `ps`'s per-line rendering: `PID\tPPID\tPRI\tSTAT\tCMD`.
    pub fn ps_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.pid,
            self.ppid,
            self.priority,
            self.status.ps_char(),
            self.command
        )
    }
}
