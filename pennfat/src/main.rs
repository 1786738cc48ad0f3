//! `pennfat`: a standalone REPL for creating, mounting, and manipulating a
//! PennOS FAT volume without booting the kernel or scheduler — useful for
//! preparing a filesystem image before `pennos` boots against it.
//!
//! Grounded in `original_source/src/pennfat.c`'s `main()` loop and its
//! `mkfs`/`mount`/`unmount`/`touch`/`mv`/`rm`/`cat`/`cp`/`chmod`/`ls`
//! command dispatch.

use std::io::{self, Write};

use pennos_abi::{OpenMode, Permissions};
use pennos_fs::{FdTable, FileSystem};

const PROMPT: &str = "pennfat# ";

fn main() {
    pennos_lib::logging::init_diagnostic_logging();

    let mut fs: Option<FileSystem> = None;
    let mut fds = FdTable::new();

    loop {
        eprint!("{PROMPT}");
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(err) => {
                eprintln!("pennfat: read error: {err}");
                return;
            }
        }

        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = args.first() else { continue };

        match command {
            "mkfs" => cmd_mkfs(&mut fs, &args),
            "mount" => cmd_mount(&mut fs, &args),
            "unmount" => cmd_unmount(&mut fs, &args),
            "touch" => with_mounted(&mut fs, |fs| cmd_touch(fs, &args)),
            "mv" => with_mounted(&mut fs, |fs| cmd_mv(fs, &args)),
            "rm" => with_mounted(&mut fs, |fs| cmd_rm(fs, &args)),
            "cat" => with_mounted(&mut fs, |fs| cmd_cat(fs, &mut fds, &args)),
            "cp" => with_mounted(&mut fs, |fs| cmd_cp(fs, &mut fds, &args)),
            "chmod" => with_mounted(&mut fs, |fs| cmd_chmod(fs, &args)),
            "ls" => with_mounted(&mut fs, |fs| cmd_ls(fs, &args)),
            other => eprintln!("command not found: {other}"),
        }
    }
}

fn with_mounted(fs: &mut Option<FileSystem>, action: impl FnOnce(&mut FileSystem)) {
    match fs {
        Some(fs) => action(fs),
        None => eprintln!("filesystem not mounted"),
    }
}

fn cmd_mkfs(fs: &mut Option<FileSystem>, args: &[&str]) {
    if fs.is_some() {
        eprintln!("mkfs: unexpected command");
        return;
    }
    let [_, name, blocks, block_size_code] = args else {
        eprintln!("mkfs: invalid number of arguments");
        return;
    };
    let (Ok(blocks), Ok(block_size_code)) = (blocks.parse(), block_size_code.parse()) else {
        eprintln!("mkfs: invalid number of arguments");
        return;
    };
    if let Err(err) = pennos_fs::mkfs(name, blocks, block_size_code) {
        eprintln!("mkfs: {err}");
    }
}

fn cmd_mount(fs: &mut Option<FileSystem>, args: &[&str]) {
    if fs.is_some() {
        eprintln!("mount: unexpected command");
        return;
    }
    let [_, name] = args else {
        eprintln!("mount: invalid number of arguments");
        return;
    };
    match pennos_fs::mount(name) {
        Ok(mounted) => *fs = Some(mounted),
        Err(err) => eprintln!("mount: {err}"),
    }
}

fn cmd_unmount(fs: &mut Option<FileSystem>, args: &[&str]) {
    let _ = args;
    if fs.take().is_none() {
        eprintln!("unmount: unexpected command");
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn cmd_touch(fs: &mut FileSystem, args: &[&str]) {
    for &name in &args[1..] {
        if let Err(err) = fs.touch(name, now()) {
            eprintln!("touch: {err}");
        }
    }
}

fn cmd_mv(fs: &mut FileSystem, args: &[&str]) {
    let [_, src, dst] = args else {
        eprintln!("mv: invalid number of arguments");
        return;
    };
    if let Err(err) = fs.rename(src, dst) {
        eprintln!("mv: {err}");
    }
}

fn cmd_rm(fs: &mut FileSystem, args: &[&str]) {
    for &name in &args[1..] {
        if let Err(err) = fs.unlink(name) {
            eprintln!("rm: {err}");
        }
    }
}

/// `cat [-w|-a FILE] FILE...` and `cat SRC... [-w|-a] DEST` forms, mirroring
/// the original's argument-position cases.
fn cmd_cat(fs: &mut FileSystem, fds: &mut FdTable, args: &[&str]) {
    let rest = &args[1..];
    if rest.len() == 2 && (rest[0] == "-w" || rest[0] == "-a") {
        let mode = if rest[0] == "-w" { OpenMode::Write } else { OpenMode::Append };
        let Ok(fd_write) = fs.open(fds, rest[1], mode, now()) else {
            eprintln!("cat: error opening file");
            return;
        };
        copy_stdin_to(fs, fds, fd_write);
        let _ = fs.close(fds, fd_write);
        return;
    }

    if rest.len() >= 2 && (rest[rest.len() - 2] == "-w" || rest[rest.len() - 2] == "-a") {
        let append = rest[rest.len() - 2] == "-a";
        let dest = rest[rest.len() - 1];
        let mode = if append { OpenMode::Append } else { OpenMode::Write };
        let Ok(fd_write) = fs.open(fds, dest, mode, now()) else {
            eprintln!("cat: error opening destination file");
            return;
        };
        for &name in &rest[..rest.len() - 2] {
            copy_file_to(fs, fds, name, fd_write);
        }
        let _ = fs.close(fds, fd_write);
        return;
    }

    if rest.is_empty() {
        eprintln!("cat: invalid arguments");
        return;
    }
    for &name in rest {
        let Ok(fd_read) = fs.open(fds, name, OpenMode::Read, now()) else {
            eprintln!("cat: error opening file");
            continue;
        };
        let mut buf = [0u8; 1024];
        loop {
            match fs.read(fds, fd_read, &mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let _ = io::stdout().write_all(&buf[..n]);
                }
                Err(err) => {
                    eprintln!("cat: {err}");
                    break;
                }
            }
        }
        let _ = fs.close(fds, fd_read);
    }
    let _ = io::stdout().flush();
}

fn copy_stdin_to(fs: &mut FileSystem, fds: &mut FdTable, fd_write: i32) {
    let mut buf = String::new();
    while io::stdin().read_line(&mut buf).map(|n| n > 0).unwrap_or(false) {
        if fs.write(fds, fd_write, buf.as_bytes()).is_err() {
            eprintln!("cat: error writing to file");
            return;
        }
        buf.clear();
    }
}

fn copy_file_to(fs: &mut FileSystem, fds: &mut FdTable, src: &str, fd_write: i32) {
    let Ok(fd_read) = fs.open(fds, src, OpenMode::Read, now()) else {
        eprintln!("cat: error opening input file");
        return;
    };
    let mut buf = [0u8; 1024];
    loop {
        match fs.read(fds, fd_read, &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if fs.write(fds, fd_write, &buf[..n]).is_err() {
                    eprintln!("cat: error writing to output file");
                    break;
                }
            }
            Err(err) => {
                eprintln!("cat: {err}");
                break;
            }
        }
    }
    let _ = fs.close(fds, fd_read);
}

/// `cp SRC DST`, `cp -h SRC DST` (host->volume), `cp SRC -h DST` (volume->host).
fn cmd_cp(fs: &mut FileSystem, fds: &mut FdTable, args: &[&str]) {
    let rest = &args[1..];
    match rest {
        [src, dst] => {
            let Ok(fd_read) = fs.open(fds, src, OpenMode::Read, now()) else {
                eprintln!("cp: error opening source file");
                return;
            };
            let Ok(fd_write) = fs.open(fds, dst, OpenMode::Write, now()) else {
                eprintln!("cp: error opening destination file");
                return;
            };
            pump(fs, fds, fd_read, fd_write);
            let _ = fs.close(fds, fd_read);
            let _ = fs.close(fds, fd_write);
        }
        ["-h", src, dst] => {
            let Ok(data) = std::fs::read(src) else {
                eprintln!("cp: error opening source file from host OS");
                return;
            };
            let Ok(fd_write) = fs.open(fds, dst, OpenMode::Write, now()) else {
                eprintln!("cp: error opening destination file");
                return;
            };
            let _ = fs.write(fds, fd_write, &data);
            let _ = fs.close(fds, fd_write);
        }
        [src, "-h", dst] => {
            let Ok(fd_read) = fs.open(fds, src, OpenMode::Read, now()) else {
                eprintln!("cp: error opening source file");
                return;
            };
            let mut data = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match fs.read(fds, fd_read, &mut buf) {
                    Ok(0) => break,
                    Ok(n) => data.extend_from_slice(&buf[..n]),
                    Err(_) => break,
                }
            }
            let _ = fs.close(fds, fd_read);
            if std::fs::write(dst, &data).is_err() {
                eprintln!("cp: error writing to destination file from host OS");
            }
        }
        _ => eprintln!("cp: invalid number of arguments"),
    }
}

fn pump(fs: &mut FileSystem, fds: &mut FdTable, fd_read: i32, fd_write: i32) {
    let mut buf = [0u8; 1024];
    loop {
        match fs.read(fds, fd_read, &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if fs.write(fds, fd_write, &buf[..n]).is_err() {
                    eprintln!("cp: error writing to destination file");
                    break;
                }
            }
            Err(err) => {
                eprintln!("cp: {err}");
                break;
            }
        }
    }
}

/// `chmod [+|-]perm FILE`.
fn cmd_chmod(fs: &mut FileSystem, args: &[&str]) {
    let [_, spec, name] = args else {
        eprintln!("chmod: invalid number of arguments");
        return;
    };
    let (sign, bits) = spec.split_at(1);
    let grant = match sign {
        "+" => true,
        "-" => false,
        _ => {
            eprintln!("Invalid permission format: First character must be '+' or '-'");
            return;
        }
    };
    let mut delta = Permissions::NONE;
    for ch in bits.chars() {
        match ch {
            'r' => delta |= Permissions::READ,
            'w' => delta |= Permissions::WRITE,
            'x' => delta |= Permissions::EXECUTE,
            other => {
                eprintln!("Invalid permission format: Unknown permission character '{other}'");
                return;
            }
        }
    }
    let Ok(current) = fs.find_perm(name) else {
        eprintln!("chmod: error changing permissions");
        return;
    };
    let updated = if grant { current | delta } else { current & !delta };
    if fs.chmod(name, updated).is_err() {
        eprintln!("chmod: error changing permissions");
    }
}

fn cmd_ls(fs: &mut FileSystem, args: &[&str]) {
    if args.len() != 1 {
        eprintln!("ls: invalid number of arguments");
        return;
    }
    match fs.ls() {
        Ok(entries) => {
            for entry in entries {
                let perm = Permissions::from_bits_truncate(entry.perm);
                println!(
                    "{}{}{} {:>8} {}",
                    if perm.contains(Permissions::READ) { 'r' } else { '-' },
                    if perm.contains(Permissions::WRITE) { 'w' } else { '-' },
                    if perm.contains(Permissions::EXECUTE) { 'x' } else { '-' },
                    entry.size,
                    entry.name_str(),
                );
            }
        }
        Err(err) => eprintln!("ls: {err}"),
    }
}
