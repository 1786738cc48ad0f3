//! The on-disk kernel log: a stable, line-oriented protocol test harnesses
//! parse (spec §6), distinct from the `tracing` diagnostic stream in
//! `pennos-lib::logging`. Grounded in `kernel.c: k_write_log`.

use std::fs::File;
use std::io::Write;

use pennos_abi::{Pid, ProcessStatus};

pub struct KernelLog {
    file: File,
}

impl KernelLog {
    pub fn create(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        Ok(Self { file: File::create(path)? })
    }

    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.file, "{line}") {
            tracing::warn!(?err, "failed to write kernel log line");
        }
    }

    pub fn create_process(&mut self, tick: u64, pid: Pid, ppid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tCREATE\t{pid}\t{ppid}\t{command:<15}"));
    }

    pub fn schedule(&mut self, tick: u64, pid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tSCHEDULE\t{pid}\t{command:<15}"));
    }

    pub fn status_change(&mut self, tick: u64, status: ProcessStatus, pid: Pid, priority: i32, command: &str) {
        let event = match status {
            ProcessStatus::Running => "CONTINUED",
            ProcessStatus::Stopped => "STOPPED",
            ProcessStatus::Blocked => "BLOCKED",
            ProcessStatus::Finished => "EXITED",
            ProcessStatus::Terminated => "SIGNALED",
        };
        self.write_line(&format!("[{tick:>3}]\t{event}\t{pid}\t{priority}\t{command:<15}"));
    }

    pub fn nice(&mut self, tick: u64, pid: Pid, old_priority: i32, new_priority: i32, command: &str) {
        self.write_line(&format!(
            "[{tick:>3}]\tNICE\t{pid}\t{old_priority}\t{new_priority}\t{command:<15}"
        ));
    }

    pub fn zombie(&mut self, tick: u64, pid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tZOMBIE\t{pid}\t{command:<15}"));
    }

    pub fn orphan(&mut self, tick: u64, pid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tORPHAN\t{pid}\t{command:<15}"));
    }

    pub fn waited(&mut self, tick: u64, pid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tWAITED\t{pid}\t{command:<15}"));
    }

    pub fn unblocked(&mut self, tick: u64, pid: Pid, command: &str) {
        self.write_line(&format!("[{tick:>3}]\tUNBLOCKED\t{pid}\t{command:<15}"));
    }
}
