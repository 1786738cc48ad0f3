//! The kernel proper: PID/PCB bookkeeping, the priority scheduler, and the
//! process syscalls (spec §3 Components A, E, F, G).
//!
//! Mirrors the teacher's `core` crate (`scheduler/` + `syscall/`); where
//! the teacher's scheduler drives hardware context switches, this one
//! drives OS threads behind a cooperative turn gate (see
//! [`scheduler::TaskGate`]).

pub mod error;
pub mod kernel;
pub mod klog;
pub mod pcb;
pub mod pid_deque;
pub mod registry;
pub mod scheduler;
pub mod syscall;

pub use error::{KernelError, KernelResult};
pub use kernel::Kernel;
pub use pcb::Pcb;
pub use scheduler::{Scheduler, TaskBody, TaskGate};
pub use syscall::TaskContext;
