//! Maps a command name to how the shell runs it: as a process spawned
//! through the scheduler (ordinary builtins and the stress-test programs),
//! or directly on the shell's own thread (job-control builtins that act on
//! the shell's own job table rather than anything a child process could see).
//!
//! Grounded in `builtins.c`'s `function_map` and `shell.c`'s
//! `is_shell_builtin`.

use pennos_core::{TaskBody, TaskContext};

use crate::builtins;
use crate::parser::ParsedCommand;

/// Builtins that run on the shell's own thread (`bg`, `fg`, `jobs`,
/// `logout` in the original's `shell.c`).
pub fn is_shell_direct(name: &str) -> bool {
    matches!(name, "bg" | "fg" | "jobs" | "logout")
}

/// True if `name` names any known command. PennOS never `exec`s an
/// arbitrary host binary, so anything not covered here is `CmdNotFound`.
pub fn is_known_command(name: &str) -> bool {
    is_shell_direct(name) || builtins::is_spawnable(name)
}

/// Build the task body for a spawnable command, closing over its argv and
/// the stdin/stdout fds the shell already resolved (reserved host-stdio fds
/// or a freshly opened redirection target).
pub fn spawn_body(parsed: &ParsedCommand, stdin_fd: i32, stdout_fd: i32) -> Option<TaskBody> {
    let name = parsed.args.first()?.clone();
    if !builtins::is_spawnable(&name) {
        return None;
    }
    let args = parsed.args[1..].to_vec();
    Some(Box::new(move |ctx: TaskContext| builtins::run(&name, &ctx, &args, stdin_fd, stdout_fd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_direct_builtins_are_not_spawnable() {
        for name in ["bg", "fg", "jobs", "logout"] {
            assert!(is_shell_direct(name));
            assert!(!builtins::is_spawnable(name));
        }
    }

    #[test]
    fn unknown_command_is_neither() {
        assert!(!is_known_command("frobnicate"));
    }
}
