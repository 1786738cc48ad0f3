//! Process-syscall ABI types: error codes and wait-status helpers.
//!
//! The syscall surface (spec §6/§7) returns C-style sentinel/errno pairs
//! rather than `Result`; these are the stable codes tasks observe, and the
//! translation point where `pennos-core`/`pennos-fs`'s internal `thiserror`
//! error types collapse down to this ABI.

/// Process-level error codes (mirrors the original system's error numbering
/// so log output and test fixtures referencing raw codes stay stable).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid argument(s) to a syscall or builtin.
    InvalidArg = 1,
    /// No such file or directory.
    NoSuchFile = 2,
    /// Invalid signal number.
    InvalidSignal = 3,
    /// No child processes to wait on.
    NoChild = 4,
    /// Internal deque invariant violated.
    DequeError = 5,
    /// File descriptor table error (bad fd, table full).
    FdError = 6,
    /// I/O error reading/writing the FAT volume.
    IoError = 7,
    /// Command line failed to parse.
    ParseError = 8,
    /// Permission denied for the requested file operation.
    PermError = 9,
    /// Command not found.
    CmdNotFound = 10,
    /// Underlying host OS call failed.
    HostError = 11,
    /// Invalid or unknown job id.
    InvalidJob = 12,
}

impl ErrorCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidArg => "invalid argument",
            Self::NoSuchFile => "no such file or directory",
            Self::InvalidSignal => "invalid signal",
            Self::NoChild => "no child processes",
            Self::DequeError => "deque error",
            Self::FdError => "file descriptor error",
            Self::IoError => "I/O error",
            Self::ParseError => "parse error",
            Self::PermError => "permission denied",
            Self::CmdNotFound => "command not found",
            Self::HostError => "host OS error",
            Self::InvalidJob => "invalid job",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Raw `waitpid` status values observed by callers (macros.h STATUS_* and
/// P_WIF* family). A `WaitStatus` packages one of these together with the
/// pid it belongs to.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawStatus {
    Running = 100,
    Stopped = 101,
    Blocked = 102,
    Finished = 103,
    Terminated = 104,
}

impl RawStatus {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
    pub const fn is_exited(self) -> bool {
        matches!(self, Self::Finished)
    }
    pub const fn is_signaled(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// `waitpid`'s pid argument: a specific pid, "any child", or "any child in
/// this process group" (the last is accepted by the parser but behaves like
/// "any child" since PennOS has no process groups).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitTarget {
    AnyChild,
    Pid(crate::task::Pid),
}

bitflags::bitflags! {
    /// Flags accepted by `waitpid`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WaitFlags: u32 {
        /// Return immediately if no child has changed state (`WNOHANG`).
        const NOHANG = 0b01;
    }
}
