//! The kernel-internal (`k_*`) operations: process creation, exit,
//! wait/reap, signal delivery, sleep, and priority changes. These are
//! wrapped by the thin `s_*` syscall layer in [`crate::syscall`], mirroring
//! the original's `kernel.c`/`kernel_system.c` split.

use std::collections::VecDeque;

use pennos_abi::{ErrorCode, JobId, Pid, ProcessStatus, Signal, SHELL_PID};
use pennos_fs::FileSystem;

use crate::klog::KernelLog;
use crate::pcb::Pcb;
use crate::registry::ProcessTable;

pub struct Kernel {
    pub table: ProcessTable,
    pub fs: FileSystem,
    pub log: KernelLog,
    pub tick: u64,
    pub fg_pid: Pid,
    pub plus_pid: Pid,
    pub logged_out: bool,
}

impl Kernel {
    pub fn new(fs: FileSystem, log: KernelLog) -> Self {
        Self {
            table: ProcessTable::new(),
            fs,
            log,
            tick: 0,
            fg_pid: SHELL_PID,
            plus_pid: SHELL_PID,
            logged_out: false,
        }
    }

    /// Create and register a new PCB (`k_proc_create`). Announces
    /// `"[job_id] pid"` when spawned as a background job directly under
    /// the shell, same as the original.
    pub fn create_process(&mut self, ppid: Pid, command: &str, is_background: bool, priority: i32) -> Pid {
        let pid = self.table.allocate_pid();
        let mut pcb = Pcb::new(pid, ppid, command, is_background);
        pcb.priority = priority;
        if is_background && ppid == SHELL_PID {
            let job_id = self.table.allocate_job_id();
            pcb.job_id = Some(job_id);
            println!("[{job_id}] {pid}");
        }
        self.log.create_process(self.tick, pid, ppid, command);
        self.table.insert(pcb);
        self.table.reschedule(pid);
        if let Some(parent) = self.table.get_mut(ppid) {
            parent.children.push(pid);
        }
        pid
    }

    pub fn change_priority(&mut self, pid: Pid, new_priority: i32) -> Result<(), ErrorCode> {
        let Some(pcb) = self.table.get_mut(pid) else { return Err(ErrorCode::InvalidArg) };
        let old_priority = pcb.priority;
        pcb.priority = new_priority;
        let command = pcb.command.clone();
        self.log.nice(self.tick, pid, old_priority, new_priority, &command);
        self.table.reschedule(pid);
        Ok(())
    }

    /// `k_exit`: mark finished, log EXITED/ZOMBIE, and notify the parent.
    /// Cleanup of the PCB itself (and cascading cleanup of any remaining
    /// children) happens once the parent reaps it via `waitpid`
    /// (`k_proc_cleanup`).
    pub fn exit(&mut self, pid: Pid, exit_code: i32) {
        let Some(pcb) = self.table.get_mut(pid) else { return };
        pcb.status = ProcessStatus::Finished;
        pcb.exit_status = Some(exit_code);
        let ppid = pcb.ppid;
        let priority = pcb.priority;
        let command = pcb.command.clone();
        self.log.status_change(self.tick, ProcessStatus::Finished, pid, priority, &command);
        self.log.zombie(self.tick, pid, &command);
        self.table.reschedule(pid);
        self.notify_parent(ppid, pid);
    }

    pub fn send_signal(&mut self, pid: Pid, signal: Signal) -> Result<(), ErrorCode> {
        let Some(pcb) = self.table.get_mut(pid) else { return Err(ErrorCode::InvalidArg) };
        let command = pcb.command.clone();
        let priority = pcb.priority;
        let ppid = pcb.ppid;
        let children = pcb.children.clone();
        match signal {
            Signal::Stop => {
                pcb.status = ProcessStatus::Stopped;
                pcb.last_signal = Some(signal);
                self.log.status_change(self.tick, ProcessStatus::Stopped, pid, priority, &command);
                self.table.reschedule(pid);
            }
            Signal::Cont => {
                pcb.status = ProcessStatus::Running;
                self.log.status_change(self.tick, ProcessStatus::Running, pid, priority, &command);
                self.table.reschedule(pid);
            }
            Signal::Term => {
                pcb.status = ProcessStatus::Terminated;
                pcb.last_signal = Some(signal);
                self.log.status_change(self.tick, ProcessStatus::Terminated, pid, priority, &command);
                self.log.zombie(self.tick, pid, &command);
                for child in children {
                    if let Some(child_pcb) = self.table.get(child) {
                        let child_command = child_pcb.command.clone();
                        self.log.orphan(self.tick, child, &child_command);
                    }
                }
                self.table.reschedule(pid);
                self.notify_parent(ppid, pid);
            }
        }
        Ok(())
    }

    /// Push the child's pid onto the parent's status-change queue, and if
    /// the parent was blocked inside a `waitpid` call, wake it: move it
    /// back to Running and its run-priority deque, and log UNBLOCKED.
    fn notify_parent(&mut self, ppid: Pid, pid: Pid) {
        let Some(parent) = self.table.get_mut(ppid) else { return };
        parent.status_changes.push_back(pid);
        let was_blocking = parent.blocking;
        parent.blocking = false;
        if was_blocking && parent.status == ProcessStatus::Blocked {
            parent.status = ProcessStatus::Running;
            let command = parent.command.clone();
            self.log.unblocked(self.tick, ppid, &command);
            self.table.reschedule(ppid);
        }
    }

    /// `k_sleep`: move `pid` to Blocked for `ticks` scheduler ticks.
    pub fn sleep(&mut self, pid: Pid, ticks: u32) {
        let Some(pcb) = self.table.get_mut(pid) else { return };
        pcb.status = ProcessStatus::Blocked;
        pcb.sleep_ticks = ticks;
        let command = pcb.command.clone();
        let priority = pcb.priority;
        self.log.status_change(self.tick, ProcessStatus::Blocked, pid, priority, &command);
        self.table.reschedule(pid);
    }

    /// `k_sleep_check`: decrement every blocked sleeper, waking those that
    /// reach zero.
    pub fn wake_sleepers(&mut self) {
        let sleeping: Vec<Pid> = self
            .table
            .iter()
            .filter(|pcb| pcb.status == ProcessStatus::Blocked && pcb.sleep_ticks > 0)
            .map(|pcb| pcb.pid)
            .collect();
        for pid in sleeping {
            if let Some(pcb) = self.table.get_mut(pid) {
                pcb.sleep_ticks -= 1;
                if pcb.sleep_ticks == 0 {
                    pcb.status = ProcessStatus::Finished;
                    let ppid = pcb.ppid;
                    self.table.reschedule(pid);
                    self.notify_parent(ppid, pid);
                }
            }
        }
    }

    /// `k_waitpid`: reap a finished/terminated child. `target` of `None`
    /// means "any child". Returns the reaped pid and its raw status.
    pub fn waitpid(&mut self, parent: Pid, target: Option<Pid>, nohang: bool) -> Result<Option<(Pid, ProcessStatus)>, ErrorCode> {
        let Some(parent_pcb) = self.table.get(parent) else { return Err(ErrorCode::InvalidArg) };
        if parent_pcb.children.is_empty() {
            return Err(ErrorCode::NoChild);
        }
        if let Some(pid) = target {
            if !parent_pcb.children.contains(&pid) {
                return Err(ErrorCode::InvalidArg);
            }
        }

        let ready = self.find_reapable(parent, target);
        let Some(pid) = ready else {
            if nohang {
                return Ok(None);
            }
            if let Some(parent_pcb) = self.table.get_mut(parent) {
                parent_pcb.blocking = true;
                parent_pcb.status = ProcessStatus::Blocked;
                let priority = parent_pcb.priority;
                let command = parent_pcb.command.clone();
                self.log.status_change(self.tick, ProcessStatus::Blocked, parent, priority, &command);
                self.table.reschedule(parent);
            }
            return Ok(None);
        };

        let status = self.table.get(pid).map(|p| p.status).unwrap_or(ProcessStatus::Finished);
        if status.is_zombie() {
            self.cleanup(pid);
        }
        let command = self.table.get(parent).map(|p| p.command.clone()).unwrap_or_default();
        self.log.waited(self.tick, pid, &command);
        Ok(Some((pid, status)))
    }

    fn find_reapable(&mut self, parent: Pid, target: Option<Pid>) -> Option<Pid> {
        let Some(parent_pcb) = self.table.get_mut(parent) else { return None };
        let position = parent_pcb
            .status_changes
            .iter()
            .position(|&pid| target.is_none_or(|t| t == pid));
        position.and_then(|i| {
            let mut removed = None;
            for _ in 0..=i {
                if let Some(pid) = parent_pcb.status_changes.pop_front() {
                    removed = Some(pid);
                }
            }
            removed
        })
    }

    /// `k_proc_cleanup`: detach a finished/terminated child from its
    /// parent and delete its PCB, recursively cleaning up (orphaning) any
    /// children it still has, since this process is their only ancestor
    /// and nothing in this design reparents orphans onto a new owner.
    /// Zombies notify the shell directly via job announcement when
    /// backgrounded.
    fn cleanup(&mut self, pid: Pid) {
        let Some(pcb) = self.table.get(pid) else { return };
        let ppid = pcb.ppid;
        let job_id = pcb.job_id;
        let is_background = pcb.is_background;
        let command = pcb.command.clone();
        let children = pcb.children.clone();
        if is_background && ppid == SHELL_PID {
            if let Some(job_id) = job_id {
                println!("[{job_id}]+  Done\t{command}");
            }
        }
        for child in children {
            if let Some(child_pcb) = self.table.get(child) {
                let child_command = child_pcb.command.clone();
                self.log.orphan(self.tick, child, &child_command);
                self.cleanup(child);
            }
        }
        if let Some(parent) = self.table.get_mut(ppid) {
            parent.children.retain(|&c| c != pid);
        }
        self.table.remove(pid);
    }

    pub fn handle_fg(&mut self, job_id: JobId) -> Result<Pid, ErrorCode> {
        let pid = self.pid_for_job(job_id).ok_or(ErrorCode::InvalidJob)?;
        self.send_signal(pid, Signal::Cont).ok();
        if let Some(pcb) = self.table.get_mut(pid) {
            pcb.is_background = false;
        }
        self.fg_pid = pid;
        Ok(pid)
    }

    pub fn handle_bg(&mut self, job_id: JobId) -> Result<Pid, ErrorCode> {
        let pid = self.pid_for_job(job_id).ok_or(ErrorCode::InvalidJob)?;
        self.send_signal(pid, Signal::Cont)?;
        Ok(pid)
    }

    fn pid_for_job(&self, job_id: JobId) -> Option<Pid> {
        self.table.iter().find(|pcb| pcb.job_id == Some(job_id)).map(|pcb| pcb.pid)
    }

    pub fn jobs_listing(&self) -> Vec<String> {
        self.table
            .iter()
            .filter(|pcb| pcb.ppid == SHELL_PID && pcb.job_id.is_some())
            .map(|pcb| {
                let marker = if pcb.pid == self.plus_pid { '+' } else { '-' };
                let status = match pcb.status {
                    ProcessStatus::Running => "Running",
                    ProcessStatus::Stopped => "Stopped",
                    ProcessStatus::Blocked => "Blocked",
                    ProcessStatus::Finished | ProcessStatus::Terminated => "Done",
                };
                format!("[{}]{} {} ({})", pcb.job_id.unwrap(), marker, pcb.command, status)
            })
            .collect()
    }
}

pub fn zombie_children(table: &ProcessTable, pid: Pid) -> VecDeque<Pid> {
    table.get(pid).map(|p| p.status_changes.clone()).unwrap_or_default()
}
