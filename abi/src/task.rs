//! Process ABI types shared between the kernel and userland.
//!
//! This module contains **only** the types, constants, and enums that form the
//! stable interface between kernel subsystems. Kernel-internal implementation
//! details (the PCB struct, the priority deques, scheduler linkage) live in
//! `pennos_core::scheduler`.

// --- Process identifiers ---

/// A process ID, assigned sequentially starting at 1 (PID 0 is reserved).
pub type Pid = i32;

/// A shell job number, assigned sequentially as background jobs are created.
pub type JobId = i32;

pub const PID_NONE: Pid = -1;
pub const SHELL_PID: Pid = 1;

// --- Process priority ---

/// Priority levels sampled by the scheduler's weighted selection (spec §4.4).
/// `Inactive` is not a run priority: it marks the deque holding
/// stopped/blocked/finished/terminated processes that are not schedulable.
pub const PRIORITY_HIGH: i32 = 0;
pub const PRIORITY_MEDIUM: i32 = 1;
pub const PRIORITY_LOW: i32 = 2;

/// Index of the inactive deque in the 4-deque priority table.
pub const PRIORITY_INACTIVE: usize = 3;

/// Number of priority deques (3 run levels + 1 inactive level).
pub const NUM_PRIORITY_LEVELS: usize = 4;

/// Relative weights of the three run priorities in the scheduler's weighted
/// sample (high : medium : low).
pub const PRIORITY_WEIGHTS: [u32; 3] = [9, 6, 4];

// --- ProcessStatus ---

/// Type-safe process status with explicit state-machine semantics.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    #[default]
    Running = 0,
    Stopped = 1,
    Blocked = 2,
    Finished = 3,
    Terminated = 4,
}

impl ProcessStatus {
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Stopped,
            2 => Self::Blocked,
            3 => Self::Finished,
            4 => Self::Terminated,
            _ => Self::Running,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether the process is a zombie awaiting reaping by its parent.
    #[inline]
    pub const fn is_zombie(self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }

    /// Single-character status code used by `ps` (R/S/B/Z).
    pub const fn ps_char(self) -> char {
        match self {
            Self::Running => 'R',
            Self::Stopped => 'S',
            Self::Blocked => 'B',
            Self::Finished | Self::Terminated => 'Z',
        }
    }

    #[inline]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Running => matches!(target, Self::Stopped | Self::Blocked | Self::Finished | Self::Terminated),
            Self::Stopped => matches!(target, Self::Running | Self::Terminated),
            Self::Blocked => matches!(target, Self::Running | Self::Finished | Self::Terminated),
            Self::Finished | Self::Terminated => false,
        }
    }
}

// --- Signals delivered via kill ---

/// The three signals the kernel delivers to processes (macros.h: P_SIGSTOP,
/// P_SIGCONT, P_SIGTERM). Numbered to match the original implementation so
/// log output and test fixtures referencing raw signal numbers stay stable.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Stop = 69,
    Cont = 70,
    Term = 71,
}

impl Signal {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            69 => Some(Self::Stop),
            70 => Some(Self::Cont),
            71 => Some(Self::Term),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

// --- Job control ---

/// Marker printed next to the "current" job in `jobs` output.
pub const JOB_MARKER_CURRENT: char = '+';
pub const JOB_MARKER_OTHER: char = '-';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_u8() {
        for status in [
            ProcessStatus::Running,
            ProcessStatus::Stopped,
            ProcessStatus::Blocked,
            ProcessStatus::Finished,
            ProcessStatus::Terminated,
        ] {
            assert_eq!(ProcessStatus::from_u8(status.as_u8()), status);
        }
    }

    #[test]
    fn zombie_covers_finished_and_terminated_only() {
        assert!(ProcessStatus::Finished.is_zombie());
        assert!(ProcessStatus::Terminated.is_zombie());
        assert!(!ProcessStatus::Running.is_zombie());
        assert!(!ProcessStatus::Stopped.is_zombie());
        assert!(!ProcessStatus::Blocked.is_zombie());
    }

    #[test]
    fn signal_numbers_match_kernel_constants() {
        assert_eq!(Signal::Stop.as_u8(), 69);
        assert_eq!(Signal::Cont.as_u8(), 70);
        assert_eq!(Signal::Term.as_u8(), 71);
    }
}
