//! The PCB registry: every live process plus the three run-priority
//! deques and the inactive deque (stopped/blocked/finished/terminated).
//!
//! Grounded in `original_source/src/util/PCBDeque.c` and the global
//! `PCBList`/`priorityList[4]` state in `pennos.c`.

use std::collections::HashMap;

use pennos_abi::{JobId, Pid, ProcessStatus, NUM_PRIORITY_LEVELS, PRIORITY_INACTIVE, SHELL_PID};

use crate::pcb::Pcb;
use crate::pid_deque::PidDeque;

pub struct ProcessTable {
    pcbs: HashMap<Pid, Pcb>,
    /// All processes, in creation order — mirrors `PCBList` and drives `ps`.
    job_list: Vec<Pid>,
    priority: [PidDeque; NUM_PRIORITY_LEVELS],
    next_pid: Pid,
    next_job_id: JobId,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            pcbs: HashMap::new(),
            job_list: Vec::new(),
            priority: Default::default(),
            next_pid: SHELL_PID,
            next_job_id: 1,
        }
    }

    pub fn allocate_pid(&mut self) -> Pid {
        let pid = self.next_pid;
        self.next_pid += 1;
        pid
    }

    pub fn allocate_job_id(&mut self) -> JobId {
        let id = self.next_job_id;
        self.next_job_id += 1;
        id
    }

    pub fn insert(&mut self, pcb: Pcb) {
        let pid = pcb.pid;
        self.job_list.push(pid);
        self.priority[pcb.priority as usize].push_back(pid);
        self.pcbs.insert(pid, pcb);
    }

    pub fn get(&self, pid: Pid) -> Option<&Pcb> {
        self.pcbs.get(&pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Pcb> {
        self.pcbs.get_mut(&pid)
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Pcb> {
        self.job_list.retain(|&p| p != pid);
        for deque in &mut self.priority {
            deque.remove(pid);
        }
        self.pcbs.remove(&pid)
    }

    /// Every process, in creation order (for `ps`).
    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.job_list.iter().filter_map(move |pid| self.pcbs.get(pid))
    }

    /// Move `pid` to the deque matching its current (run or inactive)
    /// priority/status, removing it from wherever it was.
    pub fn reschedule(&mut self, pid: Pid) {
        for deque in &mut self.priority {
            deque.remove(pid);
        }
        let Some(pcb) = self.pcbs.get(&pid) else { return };
        let level = if pcb.status == ProcessStatus::Running {
            pcb.priority as usize
        } else {
            PRIORITY_INACTIVE
        };
        self.priority[level].push_back(pid);
    }

    pub fn priority_deque(&mut self, level: usize) -> &mut PidDeque {
        &mut self.priority[level]
    }

    pub fn inactive_deque(&mut self) -> &mut PidDeque {
        &mut self.priority[PRIORITY_INACTIVE]
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
