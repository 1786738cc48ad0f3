//! The shell: the first process PennOS spawns (`SHELL_PID`). Reads lines
//! with `rustyline`, persists them through [`pennos_lib::HistoryStore`],
//! parses them, and either runs a job-control builtin directly or spawns a
//! child through the scheduler.
//!
//! Grounded in `original_source/src/user/shell.c`'s main loop.

use pennos_abi::{OpenMode, PRIORITY_MEDIUM};
use pennos_core::TaskContext;
use pennos_lib::HistoryStore;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::parser::{self, ParsedCommand};
use crate::registry;

const PROMPT: &str = "pennos$ ";

/// The shell's task body, run on `SHELL_PID`'s own OS thread by the
/// scheduler just like any other process.
pub fn run(ctx: TaskContext, history_path: std::path::PathBuf) -> i32 {
    let history = HistoryStore::new(history_path);
    let mut editor = DefaultEditor::new().expect("failed to initialize line editor");
    for line in history.load().unwrap_or_default() {
        let _ = editor.add_history_entry(line);
    }

    loop {
        reap_finished_jobs(&ctx);

        match editor.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);
                let _ = history.append(trimmed);
                if run_line(&ctx, trimmed) {
                    return 0;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return 0,
            Err(_) => return 1,
        }
    }
}

/// Runs one parsed line. Returns `true` if the shell should exit
/// (`logout`).
fn run_line(ctx: &TaskContext, line: &str) -> bool {
    let parsed = match parser::parse(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("pennos: {err}");
            return false;
        }
    };

    let name = parsed.args[0].as_str();
    if registry::is_shell_direct(name) {
        return run_shell_direct(ctx, &parsed);
    }
    if !registry::is_known_command(name) {
        eprintln!("pennos: {name}: command not found");
        return false;
    }

    run_spawned(ctx, parsed);
    false
}

/// `bg`/`fg`/`jobs`/`logout`: acted on directly rather than through a
/// spawned child, since they manipulate the shell's own view of its jobs.
fn run_shell_direct(ctx: &TaskContext, parsed: &ParsedCommand) -> bool {
    match parsed.args[0].as_str() {
        "jobs" => {
            for line in ctx.s_jobs() {
                println!("{line}");
            }
            false
        }
        "fg" => {
            if let Some(job_id) = parsed.args.get(1).and_then(|s| s.parse().ok()) {
                match ctx.s_handle_fg(job_id) {
                    Ok(pid) => {
                        let _ = ctx.s_waitpid(Some(pid), false);
                    }
                    Err(err) => eprintln!("fg: {err}"),
                }
            } else {
                eprintln!("fg: usage: fg job_id");
            }
            false
        }
        "bg" => {
            if let Some(job_id) = parsed.args.get(1).and_then(|s| s.parse().ok()) {
                if let Err(err) = ctx.s_handle_bg(job_id) {
                    eprintln!("bg: {err}");
                }
            } else {
                eprintln!("bg: usage: bg job_id");
            }
            false
        }
        "logout" => true,
        _ => false,
    }
}

/// Resolve redirection, spawn the command's task body, and either wait for
/// it (foreground) or let it run detached (background, per job-control
/// announcements already printed by `Kernel::create_process`).
fn run_spawned(ctx: &TaskContext, parsed: ParsedCommand) {
    let stdin_fd = match &parsed.stdin_file {
        Some(path) => match ctx.s_open(path, OpenMode::Read, now()) {
            Ok(fd) => fd,
            Err(err) => {
                eprintln!("pennos: {path}: {err}");
                return;
            }
        },
        None => pennos_abi::STDIN_FD,
    };
    let stdout_fd = match &parsed.stdout_file {
        Some(path) => {
            let mode = if parsed.is_file_append { OpenMode::Append } else { OpenMode::Write };
            match ctx.s_open(path, mode, now()) {
                Ok(fd) => fd,
                Err(err) => {
                    eprintln!("pennos: {path}: {err}");
                    return;
                }
            }
        }
        None => pennos_abi::STDOUT_FD,
    };

    let command_line = parsed.args.join(" ");
    let is_background = parsed.is_background;
    let Some(body) = registry::spawn_body(&parsed, stdin_fd, stdout_fd) else {
        eprintln!("pennos: {}: command not found", parsed.args[0]);
        return;
    };

    let child = ctx.s_spawn(&command_line, is_background, PRIORITY_MEDIUM, body);
    if !is_background {
        let _ = ctx.s_waitpid(Some(child), false);
    }
}

/// Drains finished background jobs without blocking, so `[n]+ Done`
/// announcements (printed by `Kernel::cleanup`) surface between prompts.
fn reap_finished_jobs(ctx: &TaskContext) {
    while ctx.s_waitpid(None, true).ok().flatten().is_some() {}
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
