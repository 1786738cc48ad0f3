//! The `s_*` syscall surface: thin wrappers that lock the shared kernel
//! state, perform one `k_*`/filesystem operation, and release it. Every
//! task body receives one [`TaskContext`] bound to its own pid.
//!
//! Grounded in `original_source/src/kernel/kernel_system.c`.

use std::sync::Arc;
use std::time::Duration;

use pennos_abi::{ErrorCode, JobId, OpenMode, Permissions, Pid, ProcessStatus, Signal, Whence};

use crate::scheduler::{Scheduler, TaskBody};

#[derive(Clone)]
pub struct TaskContext {
    scheduler: Arc<Scheduler>,
    pid: Pid,
}

impl TaskContext {
    pub fn new(scheduler: Arc<Scheduler>, pid: Pid) -> Self {
        Self { scheduler, pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Voluntarily yield the remainder of this quantum back to the
    /// scheduler. Task bodies call this in busy loops and before/after
    /// blocking syscalls (spec §9's cooperative-checkpoint model).
    pub fn checkpoint(&self) {
        if let Some(gate) = self.scheduler.gate(self.pid) {
            gate.checkpoint();
        }
    }

    pub fn s_spawn(&self, command: &str, is_background: bool, priority: i32, body: TaskBody) -> Pid {
        let child_pid = {
            let mut kernel = self.scheduler.kernel.lock().unwrap();
            kernel.create_process(self.pid, command, is_background, priority)
        };
        self.scheduler.launch(child_pid, body);
        child_pid
    }

    pub fn s_waitpid(&self, target: Option<Pid>, nohang: bool) -> Result<Option<(Pid, ProcessStatus)>, ErrorCode> {
        loop {
            let result = {
                let mut kernel = self.scheduler.kernel.lock().unwrap();
                kernel.waitpid(self.pid, target, nohang)?
            };
            match result {
                Some(found) => return Ok(Some(found)),
                None if nohang => return Ok(None),
                None => self.checkpoint(),
            }
        }
    }

    pub fn s_kill(&self, target: Pid, signal: Signal) -> Result<(), ErrorCode> {
        self.scheduler.kernel.lock().unwrap().send_signal(target, signal)
    }

    pub fn s_exit(&self, code: i32) {
        self.scheduler.kernel.lock().unwrap().exit(self.pid, code);
    }

    pub fn s_nice(&self, target: Pid, priority: i32) -> Result<(), ErrorCode> {
        self.scheduler.kernel.lock().unwrap().change_priority(target, priority)
    }

    pub fn s_sleep(&self, seconds: u32) {
        let ticks = seconds * 10;
        {
            let mut kernel = self.scheduler.kernel.lock().unwrap();
            kernel.sleep(self.pid, ticks);
        }
        loop {
            self.checkpoint();
            let status = self.scheduler.kernel.lock().unwrap().table.get(self.pid).map(|p| p.status);
            if status != Some(ProcessStatus::Blocked) {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn s_handle_fg(&self, job_id: JobId) -> Result<Pid, ErrorCode> {
        self.scheduler.kernel.lock().unwrap().handle_fg(job_id)
    }

    pub fn s_handle_bg(&self, job_id: JobId) -> Result<Pid, ErrorCode> {
        self.scheduler.kernel.lock().unwrap().handle_bg(job_id)
    }

    pub fn s_ps(&self) -> Vec<String> {
        let kernel = self.scheduler.kernel.lock().unwrap();
        let mut lines = vec![crate::scheduler::ps_header().to_string()];
        lines.extend(crate::scheduler::ps_lines(&kernel));
        lines
    }

    pub fn s_jobs(&self) -> Vec<String> {
        self.scheduler.kernel.lock().unwrap().jobs_listing()
    }

    // --- Filesystem syscalls: delegate straight to `pennos_fs`, using this
    // task's own fd table. ---

    pub fn s_touch(&self, name: &str, now: i64) -> Result<(), ErrorCode> {
        let mut kernel = self.scheduler.kernel.lock().unwrap();
        kernel.fs.touch(name, now).map_err(|e| e.code())
    }

    pub fn s_open(&self, name: &str, mode: OpenMode, now: i64) -> Result<i32, ErrorCode> {
        let mut guard = self.scheduler.kernel.lock().unwrap();
        let kernel = &mut *guard;
        let pcb = kernel.table.get_mut(self.pid).ok_or(ErrorCode::InvalidArg)?;
        kernel.fs.open(&mut pcb.fd_table, name, mode, now).map_err(|e| e.code())
    }

    pub fn s_close(&self, fd: i32) -> Result<(), ErrorCode> {
        let mut guard = self.scheduler.kernel.lock().unwrap();
        let kernel = &mut *guard;
        let pcb = kernel.table.get_mut(self.pid).ok_or(ErrorCode::InvalidArg)?;
        kernel.fs.close(&mut pcb.fd_table, fd).map_err(|e| e.code())
    }

    pub fn s_read(&self, fd: i32, buf: &mut [u8]) -> Result<usize, ErrorCode> {
        let mut guard = self.scheduler.kernel.lock().unwrap();
        let kernel = &mut *guard;
        let pcb = kernel.table.get(self.pid).ok_or(ErrorCode::InvalidArg)?;
        kernel.fs.read(&pcb.fd_table, fd, buf).map_err(|e| e.code())
    }

    pub fn s_write(&self, fd: i32, data: &[u8]) -> Result<usize, ErrorCode> {
        let mut guard = self.scheduler.kernel.lock().unwrap();
        let kernel = &mut *guard;
        let pcb = kernel.table.get(self.pid).ok_or(ErrorCode::InvalidArg)?;
        kernel.fs.write(&pcb.fd_table, fd, data).map_err(|e| e.code())
    }

    pub fn s_lseek(&self, fd: i32, offset: i64, whence: Whence) -> Result<u32, ErrorCode> {
        let mut guard = self.scheduler.kernel.lock().unwrap();
        let kernel = &mut *guard;
        let pcb = kernel.table.get(self.pid).ok_or(ErrorCode::InvalidArg)?;
        kernel.fs.lseek(&pcb.fd_table, fd, offset, whence).map_err(|e| e.code())
    }

    pub fn s_unlink(&self, name: &str) -> Result<(), ErrorCode> {
        self.scheduler.kernel.lock().unwrap().fs.unlink(name).map_err(|e| e.code())
    }

    pub fn s_mv(&self, from: &str, to: &str) -> Result<(), ErrorCode> {
        self.scheduler.kernel.lock().unwrap().fs.rename(from, to).map_err(|e| e.code())
    }

    pub fn s_chmod(&self, name: &str, perm: Permissions) -> Result<(), ErrorCode> {
        self.scheduler.kernel.lock().unwrap().fs.chmod(name, perm).map_err(|e| e.code())
    }

    pub fn s_findperm(&self, name: &str) -> Result<Permissions, ErrorCode> {
        self.scheduler.kernel.lock().unwrap().fs.find_perm(name).map_err(|e| e.code())
    }

    pub fn s_ls(&self) -> Result<Vec<pennos_abi::DirEntry>, ErrorCode> {
        self.scheduler.kernel.lock().unwrap().fs.ls().map_err(|e| e.code())
    }
}
