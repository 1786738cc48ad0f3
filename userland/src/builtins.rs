//! Builtin command bodies: `ps`, `kill`, `nice_pid`, `man`, the shell's own
//! `bg`/`fg`/`jobs`/`logout`, the file-oriented commands (`echo`, `cat`,
//! `cp`, `rm`, `touch`, `mv`, `ls`, `chmod`), and the stress-test programs
//! (`busy`, `hang`, `nohang`, `recur`, `zombify`, `orphanify`).
//!
//! Grounded in `original_source/src/user/builtins.c`, one function per
//! builtin there mirrored by one function here.

use std::io::Write as _;

use pennos_abi::{ErrorCode, OpenMode, Permissions, Signal, STDIN_FD, STDOUT_FD};
use pennos_core::TaskContext;

/// Names of every command runnable as a spawned process (as opposed to the
/// shell-direct builtins in [`crate::registry::is_shell_direct`]).
const SPAWNABLE: &[&str] = &[
    "ps", "kill", "nice", "man", "echo", "cat", "cp", "rm", "touch", "mv", "ls", "chmod", "busy",
    "hang", "nohang", "recur", "zombify", "orphanify", "sleep",
];

pub fn is_spawnable(name: &str) -> bool {
    SPAWNABLE.contains(&name)
}

/// Dispatch a spawnable builtin by name. Returns the process's exit code.
pub fn run(name: &str, ctx: &TaskContext, args: &[String], stdin_fd: i32, stdout_fd: i32) -> i32 {
    let result = match name {
        "ps" => cmd_ps(ctx, stdout_fd),
        "kill" => cmd_kill(ctx, args, stdout_fd),
        "nice" => cmd_nice(ctx, args, stdout_fd),
        "man" => cmd_man(ctx, args, stdout_fd),
        "echo" => cmd_echo(ctx, args, stdout_fd),
        "cat" => cmd_cat(ctx, args, stdin_fd, stdout_fd),
        "cp" => cmd_cp(ctx, args, stdout_fd),
        "rm" => cmd_rm(ctx, args, stdout_fd),
        "touch" => cmd_touch(ctx, args, stdout_fd),
        "mv" => cmd_mv(ctx, args, stdout_fd),
        "ls" => cmd_ls(ctx, stdout_fd),
        "chmod" => cmd_chmod(ctx, args, stdout_fd),
        "sleep" => cmd_sleep(ctx, args, stdout_fd),
        "busy" => cmd_busy(ctx),
        "hang" => cmd_hang(ctx),
        "nohang" => cmd_nohang(ctx),
        "recur" => cmd_recur(ctx, args, stdout_fd),
        "zombify" => cmd_zombify(ctx),
        "orphanify" => cmd_orphanify(ctx),
        _ => Err(ErrorCode::CmdNotFound),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            write_str(ctx, stdout_fd, &format!("{name}: {err}\n"));
            1
        }
    }
}

fn write_str(ctx: &TaskContext, fd: i32, s: &str) {
    write_bytes(ctx, fd, s.as_bytes());
}

/// Write to `fd`, routing reserved stdio fds straight to the host and
/// everything else through the filesystem syscalls — mirrors the split the
/// kernel itself draws between host-wired fds 0/1/2 and fs-backed fds.
fn write_bytes(ctx: &TaskContext, fd: i32, data: &[u8]) {
    if fd == STDOUT_FD || fd == pennos_abi::STDERR_FD {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(data);
        let _ = stdout.flush();
    } else {
        let _ = ctx.s_write(fd, data);
    }
}

fn read_line_from(ctx: &TaskContext, fd: i32) -> Option<String> {
    if fd == STDIN_FD {
        let mut line = String::new();
        let n = std::io::stdin().read_line(&mut line).ok()?;
        if n == 0 {
            return None;
        }
        Some(line)
    } else {
        let mut buf = [0u8; 4096];
        let n = ctx.s_read(fd, &mut buf).ok()?;
        if n == 0 {
            return None;
        }
        Some(String::from_utf8_lossy(&buf[..n]).into_owned())
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// --- Process-inspection and control builtins ---

fn cmd_ps(ctx: &TaskContext, stdout_fd: i32) -> Result<i32, ErrorCode> {
    for line in ctx.s_ps() {
        write_str(ctx, stdout_fd, &format!("{line}\n"));
    }
    Ok(0)
}

/// `kill [-term|-stop|-cont] pid...` (`os_kill` in the original).
fn cmd_kill(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let mut signal = Signal::Term;
    let mut pids = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-term" => signal = Signal::Term,
            "-stop" => signal = Signal::Stop,
            "-cont" => signal = Signal::Cont,
            other => pids.push(other.parse::<i32>().map_err(|_| ErrorCode::InvalidArg)?),
        }
    }
    if pids.is_empty() {
        write_str(ctx, stdout_fd, "kill: usage: kill [-term|-stop|-cont] pid...\n");
        return Ok(1);
    }
    for pid in pids {
        ctx.s_kill(pid, signal)?;
    }
    Ok(0)
}

/// `nice_pid priority pid` (priority change for an already-running process).
fn cmd_nice(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let [priority, pid] = args else {
        write_str(ctx, stdout_fd, "nice: usage: nice priority pid\n");
        return Ok(1);
    };
    let priority: i32 = priority.parse().map_err(|_| ErrorCode::InvalidArg)?;
    let pid: i32 = pid.parse().map_err(|_| ErrorCode::InvalidArg)?;
    ctx.s_nice(pid, priority)?;
    Ok(0)
}

/// One-line description table for every builtin (`man` in the original).
const MANUAL: &[(&str, &str)] = &[
    ("ps", "ps - list all processes with their pid, ppid, priority, and status"),
    ("kill", "kill [-term|-stop|-cont] pid... - send a signal to one or more processes"),
    ("nice", "nice priority pid - change a running process's scheduling priority"),
    ("man", "man - list this manual"),
    ("bg", "bg job_id - resume a stopped background job"),
    ("fg", "fg job_id - bring a background job to the foreground"),
    ("jobs", "jobs - list background jobs"),
    ("logout", "logout - exit the shell"),
    ("echo", "echo [args...] - print arguments separated by spaces"),
    ("cat", "cat [file...] - print file contents, or stdin if none given"),
    ("cp", "cp [-h] src dst - copy a file; -h reads/writes through the host filesystem"),
    ("rm", "rm file... - remove one or more files"),
    ("touch", "touch file... - create a file or update its modification time"),
    ("mv", "mv src dst - rename a file"),
    ("ls", "ls - list files with their permissions and size"),
    ("chmod", "chmod [+|-]perm file - change a file's read/write/execute bits"),
    ("busy", "busy - spin forever, yielding each iteration"),
    ("hang", "hang - block forever without yielding"),
    ("nohang", "nohang - loop forever, yielding every iteration, and never exit"),
    ("recur", "recur n - recurse n times, printing progress"),
    ("zombify", "zombify - spawn a child that exits immediately and never reap it"),
    ("orphanify", "orphanify - spawn a child that outlives this process"),
    ("sleep", "sleep seconds - block for the given number of seconds"),
];

fn cmd_man(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    if args.is_empty() {
        for (_, description) in MANUAL {
            write_str(ctx, stdout_fd, &format!("{description}\n"));
        }
        return Ok(0);
    }
    for name in args {
        match MANUAL.iter().find(|(cmd, _)| cmd == name) {
            Some((_, description)) => write_str(ctx, stdout_fd, &format!("{description}\n")),
            None => write_str(ctx, stdout_fd, &format!("man: no entry for {name}\n")),
        }
    }
    Ok(0)
}

// --- File builtins ---

fn cmd_echo(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    write_str(ctx, stdout_fd, &format!("{}\n", args.join(" ")));
    Ok(0)
}

fn cmd_cat(ctx: &TaskContext, args: &[String], stdin_fd: i32, stdout_fd: i32) -> Result<i32, ErrorCode> {
    if args.is_empty() {
        while let Some(chunk) = read_line_from(ctx, stdin_fd) {
            write_str(ctx, stdout_fd, &chunk);
        }
        return Ok(0);
    }
    for name in args {
        let fd = ctx.s_open(name, OpenMode::Read, now())?;
        let mut buf = [0u8; 4096];
        loop {
            let n = ctx.s_read(fd, &mut buf)?;
            if n == 0 {
                break;
            }
            write_bytes(ctx, stdout_fd, &buf[..n]);
        }
        ctx.s_close(fd)?;
    }
    Ok(0)
}

/// `cp [-h] src dst`: `-h` copies between the host filesystem and the
/// mounted FAT volume rather than within the volume.
fn cmd_cp(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let mut host = false;
    let mut paths = Vec::new();
    for arg in args {
        if arg == "-h" {
            host = true;
        } else {
            paths.push(arg.clone());
        }
    }
    let [src, dst] = paths.as_slice() else {
        write_str(ctx, stdout_fd, "cp: usage: cp [-h] src dst\n");
        return Ok(1);
    };

    let data = if host {
        std::fs::read(src).map_err(|_| ErrorCode::IoError)?
    } else {
        let fd = ctx.s_open(src, OpenMode::Read, now())?;
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = ctx.s_read(fd, &mut buf)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }
        ctx.s_close(fd)?;
        data
    };

    if host {
        std::fs::write(dst, &data).map_err(|_| ErrorCode::IoError)?;
    } else {
        let fd = ctx.s_open(dst, OpenMode::Write, now())?;
        ctx.s_write(fd, &data)?;
        ctx.s_close(fd)?;
    }
    Ok(0)
}

fn cmd_rm(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    if args.is_empty() {
        write_str(ctx, stdout_fd, "rm: usage: rm file...\n");
        return Ok(1);
    }
    for name in args {
        ctx.s_unlink(name)?;
    }
    Ok(0)
}

fn cmd_touch(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    if args.is_empty() {
        write_str(ctx, stdout_fd, "touch: usage: touch file...\n");
        return Ok(1);
    }
    for name in args {
        ctx.s_touch(name, now())?;
    }
    Ok(0)
}

fn cmd_mv(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let [src, dst] = args else {
        write_str(ctx, stdout_fd, "mv: usage: mv src dst\n");
        return Ok(1);
    };
    ctx.s_mv(src, dst)?;
    Ok(0)
}

fn cmd_ls(ctx: &TaskContext, stdout_fd: i32) -> Result<i32, ErrorCode> {
    for entry in ctx.s_ls()? {
        let perm = Permissions::from_bits_truncate(entry.perm);
        write_str(
            ctx,
            stdout_fd,
            &format!(
                "{}{}{} {:>8} {}\n",
                if perm.contains(Permissions::READ) { 'r' } else { '-' },
                if perm.contains(Permissions::WRITE) { 'w' } else { '-' },
                if perm.contains(Permissions::EXECUTE) { 'x' } else { '-' },
                entry.size,
                entry.name_str(),
            ),
        );
    }
    Ok(0)
}

/// `chmod [+|-]perm file`, e.g. `chmod +x a.txt` or `chmod -w a.txt`.
fn cmd_chmod(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let [spec, name] = args else {
        write_str(ctx, stdout_fd, "chmod: usage: chmod [+|-]perm file\n");
        return Ok(1);
    };
    let (grant, bits) = spec.split_at(1);
    let grant = match grant {
        "+" => true,
        "-" => false,
        _ => return Err(ErrorCode::InvalidArg),
    };
    let mut delta = Permissions::NONE;
    for ch in bits.chars() {
        delta |= match ch {
            'r' => Permissions::READ,
            'w' => Permissions::WRITE,
            'x' => Permissions::EXECUTE,
            _ => return Err(ErrorCode::InvalidArg),
        };
    }
    let current = ctx.s_findperm(name)?;
    let updated = if grant { current | delta } else { current & !delta };
    ctx.s_chmod(name, updated)?;
    Ok(0)
}

fn cmd_sleep(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let [seconds] = args else {
        write_str(ctx, stdout_fd, "sleep: usage: sleep seconds\n");
        return Ok(1);
    };
    let seconds: u32 = seconds.parse().map_err(|_| ErrorCode::InvalidArg)?;
    ctx.s_sleep(seconds);
    Ok(0)
}

// --- Stress-test programs (`builtins.c`'s busy/hang/nohang/recur and the
// zombify/orphanify family used to exercise reparenting/reaping). ---

fn cmd_busy(ctx: &TaskContext) -> Result<i32, ErrorCode> {
    loop {
        ctx.checkpoint();
    }
}

/// Never yields — used to demonstrate that a task which ignores its
/// quantum still gets preempted by the scheduler's OS-thread model.
fn cmd_hang(_ctx: &TaskContext) -> Result<i32, ErrorCode> {
    loop {
        std::hint::spin_loop();
    }
}

fn cmd_nohang(ctx: &TaskContext) -> Result<i32, ErrorCode> {
    loop {
        ctx.checkpoint();
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}

fn cmd_recur(ctx: &TaskContext, args: &[String], stdout_fd: i32) -> Result<i32, ErrorCode> {
    let [count] = args else {
        write_str(ctx, stdout_fd, "recur: usage: recur n\n");
        return Ok(1);
    };
    let count: u32 = count.parse().map_err(|_| ErrorCode::InvalidArg)?;
    recur_inner(ctx, count, stdout_fd);
    Ok(0)
}

fn recur_inner(ctx: &TaskContext, remaining: u32, stdout_fd: i32) {
    if remaining == 0 {
        return;
    }
    write_str(ctx, stdout_fd, &format!("recur: {remaining}\n"));
    ctx.checkpoint();
    recur_inner(ctx, remaining - 1, stdout_fd);
}

/// Spawns a child that exits immediately and is deliberately never reaped,
/// leaving a zombie behind to exercise `ps`'s `Z` status and `waitpid`.
fn cmd_zombify(ctx: &TaskContext) -> Result<i32, ErrorCode> {
    ctx.s_spawn("zombie_child", false, pennos_abi::PRIORITY_MEDIUM, Box::new(|_| 0));
    loop {
        ctx.checkpoint();
    }
}

/// Spawns a child, then exits immediately itself, leaving the child to be
/// reparented onto the shell (or init) once `k_exit` notices.
fn cmd_orphanify(ctx: &TaskContext) -> Result<i32, ErrorCode> {
    ctx.s_spawn(
        "orphan_child",
        false,
        pennos_abi::PRIORITY_MEDIUM,
        Box::new(|child_ctx| {
            loop {
                child_ctx.checkpoint();
            }
        }),
    );
    Ok(0)
}
