//! Userland: the command parser, built-in command bodies, the stress-test
//! processes, and the shell frontend. Out of scope for the kernel's own
//! design (spec §1), but part of the complete system.
//!
//! Mirrors the teacher's `userland` crate.

pub mod builtins;
pub mod parser;
pub mod registry;
pub mod shell;
