//! The `pennos` binary: mounts (or formats) a FAT volume backed by a single
//! host file, boots the kernel and scheduler, spawns the shell as
//! [`pennos_abi::SHELL_PID`], and forwards host `SIGINT`/`SIGTSTP` to
//! whichever job currently holds the foreground.
//!
//! Grounded in `original_source/src/pennos.c`'s `main()`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pennos_abi::{Signal, SHELL_PID};
use pennos_core::{Kernel, Scheduler};

#[derive(Parser)]
#[command(name = "pennos", about = "A user-space process/filesystem simulator")]
struct Args {
    /// Path to the FAT filesystem image (created if it doesn't exist).
    fs_image: PathBuf,
    /// Path to the kernel event log (spec-stable CREATE/SCHEDULE/... lines).
    #[arg(default_value = "log/pennos.log")]
    log_file: PathBuf,
    /// Path to the shell's persisted command history.
    #[arg(long, default_value = "log/.pennos_history")]
    history_file: PathBuf,
    /// Blocks reserved for the FAT region when formatting a new image.
    #[arg(long, default_value_t = 2)]
    blocks_in_fat: u8,
    /// Block size code (0..=4, mapping to 256..=4096 bytes) when formatting.
    #[arg(long, default_value_t = 2)]
    block_size_code: u8,
}

fn main() -> anyhow::Result<()> {
    pennos_lib::logging::init_diagnostic_logging();
    let args = Args::parse();

    if let Some(parent) = args.log_file.parent() {
        std::fs::create_dir_all(parent).context("creating log directory")?;
    }

    if !args.fs_image.exists() {
        tracing::info!(path = %args.fs_image.display(), "formatting new filesystem image");
        pennos_fs::mkfs(&args.fs_image, args.blocks_in_fat, args.block_size_code)
            .context("formatting filesystem image")?;
    }
    let fs = pennos_fs::mount(&args.fs_image).context("mounting filesystem image")?;
    let log = pennos_core::klog::KernelLog::create(&args.log_file).context("opening kernel log")?;

    let kernel = Kernel::new(fs, log);
    let scheduler = Scheduler::new(kernel);

    install_signal_forwarding(&scheduler);

    {
        let mut kernel = scheduler.kernel.lock().unwrap();
        kernel.table.insert(pennos_core::Pcb::new(SHELL_PID, SHELL_PID, "pennos", false));
        kernel.table.reschedule(SHELL_PID);
    }
    let history_path = args.history_file.clone();
    scheduler.launch(
        SHELL_PID,
        Box::new(move |ctx| pennos_userland::shell::run(ctx, history_path)),
    );

    scheduler.run();
    Ok(())
}

/// Host `SIGINT`/`SIGTSTP` have no meaning to PennOS's own processes
/// directly; the original forwards them to whatever job is in the
/// foreground (`handle_sigint`/`handle_sigtstp` in `pennos.c`).
fn install_signal_forwarding(scheduler: &Arc<Scheduler>) {
    let scheduler = scheduler.clone();
    std::thread::spawn(move || {
        let mut signals = match signal_hook::iterator::Signals::new([
            signal_hook::consts::SIGINT,
            signal_hook::consts::SIGTSTP,
        ]) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::error!(?err, "failed to install host signal handlers");
                return;
            }
        };
        for signal in signals.forever() {
            let delivered = match signal {
                signal_hook::consts::SIGINT => Signal::Term,
                signal_hook::consts::SIGTSTP => Signal::Stop,
                _ => continue,
            };
            let target = scheduler.kernel.lock().unwrap().fg_pid;
            if target != SHELL_PID {
                let _ = scheduler.kernel.lock().unwrap().send_signal(target, delivered);
            }
        }
    });
}
