//! End-to-end filesystem behavior through `pennos_fs::FileSystem`'s public
//! syscall surface, exercising the write/append/truncate/lseek laws spec'd
//! for the FAT volume.

use pennos_abi::{OpenMode, Permissions, Whence};
use pennos_fs::FdTable;
use pennos_tests::temp_volume;

#[test]
fn write_mode_replaces_whole_file_each_call() {
    let (_guard, mut fs) = temp_volume();
    let mut fds = FdTable::new();

    let fd = fs.open(&mut fds, "notes.txt", OpenMode::Write, 0).unwrap();
    fs.write(&fds, fd, b"first draft, much longer than the second").unwrap();
    fs.close(&mut fds, fd).unwrap();

    let fd = fs.open(&mut fds, "notes.txt", OpenMode::Write, 0).unwrap();
    fs.write(&fds, fd, b"final").unwrap();
    fs.close(&mut fds, fd).unwrap();

    let fd = fs.open(&mut fds, "notes.txt", OpenMode::Read, 0).unwrap();
    let mut buf = [0u8; 64];
    let n = fs.read(&fds, fd, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"final");
}

/// `lseek` past the current end of a file grows the FAT chain to cover the
/// new offset, zero-fills the gap, and updates the directory entry's
/// recorded size to match — a subsequent read sees the original bytes
/// followed by zeroes up to the new offset, not an immediate EOF.
#[test]
fn lseek_past_eof_extends_chain_and_zero_fills_the_gap() {
    let (_guard, mut fs) = temp_volume();
    let mut fds = FdTable::new();

    let fd = fs.open(&mut fds, "sparse.bin", OpenMode::Write, 0).unwrap();
    fs.write(&fds, fd, b"abc").unwrap();
    let block_size = fs.volume().block_size() as u32;
    let far_offset = block_size * 2 + 5;
    let offset = fs.lseek(&fds, fd, far_offset as i64, Whence::Set).unwrap();
    assert_eq!(offset, far_offset);
    fs.close(&mut fds, fd).unwrap();

    let entry = fs.ls().unwrap().into_iter().find(|e| e.name_str() == "sparse.bin").unwrap();
    assert_eq!(entry.size, far_offset, "lseek past EOF must grow the recorded file size");
    let blocks = fs.volume().chain_blocks(entry.first_block as u32);
    assert!(blocks.len() as u32 >= far_offset.div_ceil(block_size));

    let fd = fs.open(&mut fds, "sparse.bin", OpenMode::Read, 0).unwrap();
    let mut buf = vec![0u8; far_offset as usize];
    let n = fs.read(&fds, fd, &mut buf).unwrap();
    assert_eq!(n, far_offset as usize);
    assert_eq!(&buf[..3], b"abc");
    assert!(buf[3..].iter().all(|&b| b == 0), "the gap between the old and new end must read back as zero");
}

#[test]
fn chmod_read_only_blocks_writes() {
    let (_guard, mut fs) = temp_volume();
    let mut fds = FdTable::new();

    fs.touch("readonly.txt", 0).unwrap();
    fs.chmod("readonly.txt", Permissions::READ_ONLY).unwrap();

    assert!(fs.open(&mut fds, "readonly.txt", OpenMode::Write, 0).is_err());
    let fd = fs.open(&mut fds, "readonly.txt", OpenMode::Read, 0).unwrap();
    fs.close(&mut fds, fd).unwrap();
}

#[test]
fn rename_then_unlink_round_trips_directory_listing() {
    let (_guard, mut fs) = temp_volume();
    fs.touch("a.txt", 0).unwrap();
    fs.touch("b.txt", 0).unwrap();
    fs.rename("a.txt", "c.txt").unwrap();

    let names: Vec<String> = fs.ls().unwrap().iter().map(|e| e.name_str().to_string()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"c.txt".to_string()));
    assert!(names.contains(&"b.txt".to_string()));

    fs.unlink("c.txt").unwrap();
    fs.unlink("b.txt").unwrap();
    assert!(fs.ls().unwrap().is_empty());
}

#[test]
fn concurrent_writers_on_same_file_are_rejected() {
    let (_guard, mut fs) = temp_volume();
    let mut fds = FdTable::new();

    let fd = fs.open(&mut fds, "locked.txt", OpenMode::Write, 0).unwrap();
    assert!(fs.open(&mut fds, "locked.txt", OpenMode::Append, 0).is_err());
    fs.close(&mut fds, fd).unwrap();
    assert!(fs.open(&mut fds, "locked.txt", OpenMode::Append, 0).is_ok());
}
