//! Ambient host-facing helpers shared by the kernel and its binaries.
//!
//! Where the teacher's `lib` crate hosts arch/diagnostics helpers for a
//! bare-metal kernel (`klog`, `cpu`, `stacktrace`), this crate hosts the
//! equivalent helpers for a hosted user-space process: structured logging
//! setup and command-history persistence.

pub mod history;
pub mod logging;

pub use history::HistoryStore;
