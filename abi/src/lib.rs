//! PennOS Kernel-Userland ABI Types
//!
//! This crate provides the canonical definitions for all types shared between
//! the kernel (`pennos-core`, `pennos-fs`) and userland (`pennos-userland`).
//! Having a single source of truth eliminates duplicate type definitions and
//! ABI mismatches between the two sides.

#![forbid(unsafe_code)]

pub mod fs;
pub mod signal;
pub mod syscall;
pub mod task;

pub use fs::*;
pub use signal::*;
pub use syscall::*;
pub use task::*;
