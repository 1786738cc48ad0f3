//! Structured diagnostic logging setup.
//!
//! This is deliberately separate from the on-disk kernel log file written by
//! `pennos_core::klog` (spec §6): that file is a stable test-harness
//! protocol (`"[%3d]\tCREATE\t..."` lines), while this is a `tracing`
//! subscriber for operator-facing diagnostics (mount failures, scheduler
//! panics-avoided-conditions, startup/shutdown).
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber reading its filter from `RUST_LOG`,
/// defaulting to `info` when unset. Safe to call more than once per process;
/// subsequent calls are no-ops.
pub fn init_diagnostic_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
