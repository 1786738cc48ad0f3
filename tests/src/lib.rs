//! Shared fixtures for the end-to-end integration tests in `tests/`.
//!
//! Exercises the public syscall-adjacent surface of `pennos-fs` and
//! `pennos-core` together, the way the original test suite drove the real
//! kernel through its `k_*`/`s_*` boundary rather than its internals.

use pennos_core::{Kernel, Pcb};
use pennos_fs::FileSystem;

/// A freshly formatted, mounted volume backed by a temp file that's removed
/// when the returned guard drops.
pub fn temp_volume() -> (tempfile::TempPath, FileSystem) {
    let file = tempfile::NamedTempFile::new().expect("create temp file");
    let path = file.into_temp_path();
    pennos_fs::mkfs(&path, 2, 0).expect("mkfs");
    let fs = pennos_fs::mount(&path).expect("mount");
    (path, fs)
}

/// A kernel over a fresh volume, with the shell's own PCB already inserted
/// (mirroring what `pennos`'s `main` does before spawning the shell body).
pub fn test_kernel() -> (tempfile::TempPath, Kernel) {
    let (path, fs) = temp_volume();
    let log_path = path.to_path_buf().with_extension("log");
    let log = pennos_core::klog::KernelLog::create(&log_path).expect("open kernel log");
    let mut kernel = Kernel::new(fs, log);
    kernel.table.insert(Pcb::new(pennos_abi::SHELL_PID, pennos_abi::SHELL_PID, "pennos", false));
    kernel.table.reschedule(pennos_abi::SHELL_PID);
    (path, kernel)
}
