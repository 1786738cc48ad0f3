//! The priority scheduler: weighted random selection among the run
//! priorities (spec §4.4), and the cooperative one-task-at-a-time runner
//! spec §9's Design Notes explicitly permit as an alternative to real
//! signal-driven preemption.
//!
//! Each process runs on its own OS thread; a [`TaskGate`] per thread lets
//! the scheduler grant or revoke its turn. Task bodies cooperate by
//! calling [`TaskContext::checkpoint`] at the same points the original
//! implementation's tasks naturally yield (loop iterations, blocking
//! syscalls) — there is no attempt to preempt mid-instruction, which is
//! not meaningfully expressible for safe, hosted, non-`unsafe` Rust.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use pennos_abi::{Pid, PRIORITY_WEIGHTS, SHELL_PID};
use rand::distributions::{Distribution, WeightedIndex};
use rand::thread_rng;

use crate::kernel::Kernel;
use crate::pcb::Pcb;

/// One scheduler quantum (the original's `QUANTUM` setitimer interval).
pub const QUANTUM: Duration = Duration::from_millis(100);

/// Lets the scheduler suspend and resume a single task's OS thread.
pub struct TaskGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

struct GateState {
    may_run: bool,
    finished: bool,
}

impl TaskGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState { may_run: false, finished: false }),
            cond: Condvar::new(),
        }
    }

    /// Block until the scheduler grants this task's turn (or the task
    /// table marks it finished/terminated out from under it).
    pub fn checkpoint(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.may_run && !state.finished {
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn grant(&self) {
        let mut state = self.state.lock().unwrap();
        state.may_run = true;
        self.cond.notify_all();
    }

    pub fn revoke(&self) {
        self.state.lock().unwrap().may_run = false;
    }

    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.finished = true;
        state.may_run = false;
        self.cond.notify_all();
    }
}

/// A spawned task's executable body. Receives a [`crate::syscall::TaskContext`]
/// bound to its own pid and returns its exit code.
pub type TaskBody = Box<dyn FnOnce(crate::syscall::TaskContext) -> i32 + Send + 'static>;

pub struct Scheduler {
    pub kernel: Arc<Mutex<Kernel>>,
    gates: Mutex<HashMap<Pid, Arc<TaskGate>>>,
}

impl Scheduler {
    pub fn new(kernel: Kernel) -> Arc<Self> {
        Arc::new(Self {
            kernel: Arc::new(Mutex::new(kernel)),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Register a new process and spawn its OS thread, parked until the
    /// scheduler grants it a turn. Does not itself decide priority
    /// placement — the caller (`s_spawn`) already inserted the PCB.
    pub fn launch(self: &Arc<Self>, pid: Pid, body: TaskBody) {
        let gate = Arc::new(TaskGate::new());
        self.gates.lock().unwrap().insert(pid, gate.clone());

        let scheduler = Arc::clone(self);
        thread::Builder::new()
            .name(format!("pennos-task-{pid}"))
            .spawn(move || {
                gate.checkpoint();
                let ctx = crate::syscall::TaskContext::new(scheduler.clone(), pid);
                let exit_code = body(ctx);
                scheduler.kernel.lock().unwrap().exit(pid, exit_code);
                gate.finish();
            })
            .expect("failed to spawn task thread");
    }

    pub fn gate(&self, pid: Pid) -> Option<Arc<TaskGate>> {
        self.gates.lock().unwrap().get(&pid).cloned()
    }

    pub fn drop_gate(&self, pid: Pid) {
        self.gates.lock().unwrap().remove(&pid);
    }

    /// The scheduler's main loop: pick a process, let it run for one
    /// quantum, requeue it, advance sleep timers, and repeat. Runs until
    /// the shell logs out (`logged_out`) or has no more work.
    pub fn run(self: &Arc<Self>) {
        loop {
            let next = {
                let mut kernel = self.kernel.lock().unwrap();
                if kernel.logged_out && kernel.table.get(SHELL_PID).is_none() {
                    break;
                }
                kernel.tick += 1;
                kernel.wake_sleepers();
                select_job(&mut kernel)
            };

            let Some(pid) = next else {
                thread::sleep(Duration::from_millis(10));
                continue;
            };

            if let Some(gate) = self.gate(pid) {
                {
                    let mut kernel = self.kernel.lock().unwrap();
                    let tick = kernel.tick;
                    if let Some(pcb) = kernel.table.get(pid) {
                        let command = pcb.command.clone();
                        kernel.log.schedule(tick, pid, &command);
                    }
                }
                gate.grant();
                thread::sleep(QUANTUM);
                gate.revoke();
            }

            let mut kernel = self.kernel.lock().unwrap();
            if kernel.table.get(pid).is_some() {
                kernel.table.reschedule(pid);
            }
        }
    }
}

/// Weighted selection among the non-empty run-priority deques (spec §4.4):
/// high:medium:low = 9:6:4, with ratios preserved across whichever subset
/// of levels is currently non-empty. Mirrors `select_job`'s branch table
/// in `pennos.c` without enumerating the seven subset cases by hand —
/// `WeightedIndex` over only the non-empty levels is the same distribution.
pub fn select_job(kernel: &mut Kernel) -> Option<Pid> {
    let mut levels = Vec::new();
    for level in 0..3 {
        if !kernel.table.priority_deque(level).is_empty() {
            levels.push(level);
        }
    }
    if levels.is_empty() {
        return None;
    }
    let weights: Vec<u32> = levels.iter().map(|&l| PRIORITY_WEIGHTS[l]).collect();
    let chosen_level = if levels.len() == 1 {
        levels[0]
    } else {
        let dist = WeightedIndex::new(&weights).expect("non-empty weights");
        levels[dist.sample(&mut thread_rng())]
    };
    let pid = kernel.table.priority_deque(chosen_level).pop_front()?;
    Some(pid)
}

pub fn ps_header() -> &'static str {
    "PID\tPPID\tPRI\tSTAT\tCMD"
}

pub fn ps_lines(kernel: &Kernel) -> Vec<String> {
    kernel.table.iter().map(Pcb::ps_line).collect()
}
