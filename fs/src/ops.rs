//! Filesystem syscalls (spec §3 Component D / §6): touch, open, read,
//! write, close, lseek, unlink, ls, mv, chmod, findperm.
//!
//! The write path (`write`) is the most delicate part of the original
//! implementation (`fat_helper.c: k_write`): `Write` mode replaces the
//! file's entire contents and frees any now-unused tail blocks, while
//! `Append` mode extends the chain and writes past the current end.

use pennos_abi::{DirEntry, OpenMode, Permissions, Whence, ENTRY_TYPE_FILE};

use crate::dir;
use crate::error::{FsError, FsResult};
use crate::oft::{FdTable, GlobalOft};
use crate::volume::Volume;

/// Owns the mounted volume and the table of files open across all
/// processes. Each process additionally owns its own [`FdTable`].
pub struct FileSystem {
    volume: Volume,
    oft: GlobalOft,
}

impl FileSystem {
    pub fn new(volume: Volume) -> Self {
        Self { volume, oft: GlobalOft::new() }
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Create an empty file if it doesn't already exist, or update its
    /// modification time if it does (`touch`, with no existing-file error).
    pub fn touch(&mut self, name: &str, now: i64) -> FsResult<()> {
        match dir::find_by_name(&mut self.volume, name)? {
            Some((slot, mut entry)) => {
                entry.mtime = now;
                dir::write_slot(&mut self.volume, slot, &entry)
            }
            None => {
                let slot = dir::alloc_entry_slot(&mut self.volume, name)?;
                let entry = new_file_entry(name, now);
                dir::write_slot(&mut self.volume, slot, &entry)
            }
        }
    }

    pub fn ls(&mut self) -> FsResult<Vec<DirEntry>> {
        Ok(dir::list_live_entries(&mut self.volume)?.into_iter().map(|(_, e)| e).collect())
    }

    pub fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        if dir::find_by_name(&mut self.volume, to)?.is_some() {
            return Err(FsError::AlreadyExists(to.to_string()));
        }
        let (slot, mut entry) = dir::find_by_name(&mut self.volume, from)?.ok_or_else(|| FsError::NotFound(from.to_string()))?;
        set_name(&mut entry, to);
        dir::write_slot(&mut self.volume, slot, &entry)
    }

    pub fn chmod(&mut self, name: &str, perm: Permissions) -> FsResult<()> {
        if !perm.is_legal() {
            return Err(FsError::InvalidArgument(format!(
                "unreachable permission combination {:#05b} (execute without read)",
                perm.bits()
            )));
        }
        let (slot, mut entry) = dir::find_by_name(&mut self.volume, name)?.ok_or_else(|| FsError::NotFound(name.to_string()))?;
        entry.perm = perm.bits();
        dir::write_slot(&mut self.volume, slot, &entry)
    }

    pub fn find_perm(&mut self, name: &str) -> FsResult<Permissions> {
        let (_, entry) = dir::find_by_name(&mut self.volume, name)?.ok_or_else(|| FsError::NotFound(name.to_string()))?;
        Ok(Permissions::from_bits_truncate(entry.perm))
    }

    /// Remove a file. Frees its block chain and compacts or deletes its
    /// directory slot (`dir::remove_slot`). Refuses to remove a file that
    /// is still open anywhere.
    pub fn unlink(&mut self, name: &str) -> FsResult<()> {
        let (slot, entry) = dir::find_by_name(&mut self.volume, name)?.ok_or_else(|| FsError::NotFound(name.to_string()))?;
        if self.oft.has_writer(slot) {
            return Err(FsError::ConflictingOpen);
        }
        if entry.first_block != 0 {
            self.volume.free_chain(entry.first_block as u32);
        }
        dir::remove_slot(&mut self.volume, slot)
    }

    /// Open a file for `fd_table`'s owning process, returning the
    /// allocated fd. `Write` truncates any existing content immediately;
    /// `Append`/`Read` leave it untouched. Creates the file if it doesn't
    /// exist and mode is `Write` or `Append`.
    pub fn open(&mut self, fd_table: &mut FdTable, name: &str, mode: OpenMode, now: i64) -> FsResult<i32> {
        let existing = dir::find_by_name(&mut self.volume, name)?;
        let (slot, entry) = match (existing, mode) {
            (Some((slot, entry)), _) => (slot, entry),
            (None, OpenMode::Read) => return Err(FsError::NotFound(name.to_string())),
            (None, OpenMode::Write | OpenMode::Append) => {
                let slot = dir::alloc_entry_slot(&mut self.volume, name)?;
                let entry = new_file_entry(name, now);
                dir::write_slot(&mut self.volume, slot, &entry)?;
                (slot, entry)
            }
        };

        if mode != OpenMode::Read {
            let perm = Permissions::from_bits_truncate(entry.perm);
            if !perm.contains(Permissions::WRITE) {
                return Err(FsError::PermissionDenied(name.to_string()));
            }
            if self.oft.has_writer(slot) {
                return Err(FsError::ConflictingOpen);
            }
        } else {
            let perm = Permissions::from_bits_truncate(entry.perm);
            if !perm.contains(Permissions::READ) {
                return Err(FsError::PermissionDenied(name.to_string()));
            }
        }

        let offset = match mode {
            OpenMode::Write => {
                if entry.first_block != 0 {
                    self.volume.free_chain(entry.first_block as u32);
                }
                let mut entry = entry;
                entry.first_block = 0;
                entry.size = 0;
                dir::write_slot(&mut self.volume, slot, &entry)?;
                0
            }
            OpenMode::Append => entry.size,
            OpenMode::Read => 0,
        };

        let oft_index = self.oft.open(slot, mode, offset)?;
        fd_table.allocate(oft_index)
    }

    pub fn close(&mut self, fd_table: &mut FdTable, fd: i32) -> FsResult<()> {
        let oft_index = fd_table.release(fd)?;
        self.oft.close(oft_index)
    }

    pub fn read(&mut self, fd_table: &FdTable, fd: i32, buf: &mut [u8]) -> FsResult<usize> {
        let oft_index = fd_table.oft_index(fd)?;
        let (dir_slot, offset) = {
            let file = self.oft.get(oft_index)?;
            (file.dir_slot, file.offset)
        };
        let entry = dir::read_slot(&mut self.volume, dir_slot)?;
        if offset >= entry.size {
            return Ok(0);
        }
        let to_read = buf.len().min((entry.size - offset) as usize);
        if to_read == 0 || entry.first_block == 0 {
            return Ok(0);
        }
        let block_size = self.volume.block_size() as u32;
        let blocks = self.volume.chain_blocks(entry.first_block as u32);
        let mut read = 0usize;
        while read < to_read {
            let pos = offset + read as u32;
            let block_idx = (pos / block_size) as usize;
            let within = (pos % block_size) as usize;
            let Some(&block) = blocks.get(block_idx) else { break };
            let data = self.volume.read_block(block);
            let chunk = (to_read - read).min(data.len() - within);
            buf[read..read + chunk].copy_from_slice(&data[within..within + chunk]);
            read += chunk;
        }
        self.oft.get_mut(oft_index)?.offset += read as u32;
        Ok(read)
    }

    /// See module docs: `Write`-mode files are replaced wholesale each
    /// call; `Append`-mode files grow from their current end.
    pub fn write(&mut self, fd_table: &FdTable, fd: i32, data: &[u8]) -> FsResult<usize> {
        let oft_index = fd_table.oft_index(fd)?;
        let (dir_slot, mode) = {
            let file = self.oft.get(oft_index)?;
            (file.dir_slot, file.mode)
        };
        if mode == OpenMode::Read {
            return Err(FsError::PermissionDenied("file not open for writing".into()));
        }
        let mut entry = dir::read_slot(&mut self.volume, dir_slot)?;

        let (new_head, new_size) = match mode {
            OpenMode::Write => self.replace_contents(entry.first_block, data)?,
            OpenMode::Append => {
                let head = self.ensure_head(entry.first_block)?;
                let written_end = self.write_at(head, entry.size, data)?;
                (head, written_end)
            }
            OpenMode::Read => unreachable!(),
        };

        entry.first_block = new_head as u16;
        entry.size = new_size;
        dir::write_slot(&mut self.volume, dir_slot, &entry)?;
        let file = self.oft.get_mut(oft_index)?;
        file.offset = new_size;
        Ok(data.len())
    }

    pub fn lseek(&mut self, fd_table: &FdTable, fd: i32, offset: i64, whence: Whence) -> FsResult<u32> {
        let oft_index = fd_table.oft_index(fd)?;
        let dir_slot = self.oft.get(oft_index)?.dir_slot;
        let entry = dir::read_slot(&mut self.volume, dir_slot)?;
        let base = match whence {
            Whence::Set => 0i64,
            Whence::Cur => self.oft.get(oft_index)?.offset as i64,
            Whence::End => entry.size as i64,
        };
        let new_offset = (base + offset).max(0) as u32;
        if new_offset > entry.size {
            // Extending past EOF grows the chain to cover the new offset,
            // zero-fills the newly chained blocks, and commits the larger
            // size immediately so a subsequent read sees zero bytes rather
            // than an EOF short-read between the old and new end.
            let head = self.ensure_head(entry.first_block)?;
            self.grow_chain_to(head, new_offset)?;
            self.zero_fill(head, entry.size, new_offset)?;
            let mut entry = entry;
            entry.first_block = head as u16;
            entry.size = new_offset;
            dir::write_slot(&mut self.volume, dir_slot, &entry)?;
        }
        self.oft.get_mut(oft_index)?.offset = new_offset;
        Ok(new_offset)
    }

    fn ensure_head(&mut self, first_block: u16) -> FsResult<u32> {
        if first_block != 0 {
            Ok(first_block as u32)
        } else {
            self.volume.alloc_block()
        }
    }

    /// Overwrite the file's contents with exactly `data`, freeing any
    /// blocks beyond what's needed and allocating any that are missing.
    fn replace_contents(&mut self, first_block: u16, data: &[u8]) -> FsResult<(u32, u32)> {
        if data.is_empty() {
            if first_block != 0 {
                self.volume.free_chain(first_block as u32);
            }
            return Ok((0, 0));
        }
        let head = self.ensure_head(first_block)?;
        let end = self.write_at(head, 0, data)?;
        self.truncate_chain_to(head, end)?;
        Ok((head, end))
    }

    /// Write `data` into the chain starting at `head`, beginning at byte
    /// `start_offset`, extending the chain with freshly allocated blocks as
    /// needed. Returns the offset one past the last byte written.
    fn write_at(&mut self, head: u32, start_offset: u32, data: &[u8]) -> FsResult<u32> {
        let block_size = self.volume.block_size() as u32;
        let mut blocks = self.volume.chain_blocks(head);
        let mut written = 0usize;
        while written < data.len() {
            let pos = start_offset + written as u32;
            let block_idx = (pos / block_size) as usize;
            let within = (pos % block_size) as usize;
            while blocks.len() <= block_idx {
                let tail = *blocks.last().unwrap();
                let new_block = self.volume.extend_chain(tail)?;
                blocks.push(new_block);
            }
            let block = blocks[block_idx];
            let dest = self.volume.write_block(block);
            let chunk = (data.len() - written).min(dest.len() - within);
            dest[within..within + chunk].copy_from_slice(&data[written..written + chunk]);
            written += chunk;
        }
        Ok(start_offset + written as u32)
    }

    /// Pre-allocate blocks (zero-filled by the host file's own semantics)
    /// so the chain covers at least `new_size` bytes, without writing any
    /// data — used by `lseek` past EOF.
    fn grow_chain_to(&mut self, head: u32, new_size: u32) -> FsResult<()> {
        let block_size = self.volume.block_size() as u32;
        let needed_blocks = new_size.div_ceil(block_size).max(1) as usize;
        let mut blocks = self.volume.chain_blocks(head);
        while blocks.len() < needed_blocks {
            let tail = *blocks.last().unwrap();
            let new_block = self.volume.extend_chain(tail)?;
            blocks.push(new_block);
        }
        Ok(())
    }

    /// Zero every byte in `[start, end)` across the chain starting at
    /// `head`. Used after [`Self::grow_chain_to`] so a seek past the old
    /// end reads back as zeroes instead of leftover block contents.
    fn zero_fill(&mut self, head: u32, start: u32, end: u32) -> FsResult<()> {
        if start >= end {
            return Ok(());
        }
        let block_size = self.volume.block_size() as u32;
        let blocks = self.volume.chain_blocks(head);
        let mut pos = start;
        while pos < end {
            let block_idx = (pos / block_size) as usize;
            let within = (pos % block_size) as usize;
            let Some(&block) = blocks.get(block_idx) else { break };
            let dest = self.volume.write_block(block);
            let chunk = ((end - pos) as usize).min(dest.len() - within);
            dest[within..within + chunk].fill(0);
            pos += chunk as u32;
        }
        Ok(())
    }

    /// Free every block in the chain beyond the one holding byte
    /// `new_size - 1`.
    fn truncate_chain_to(&mut self, head: u32, new_size: u32) -> FsResult<()> {
        let block_size = self.volume.block_size() as u32;
        let needed_blocks = new_size.div_ceil(block_size).max(1) as usize;
        let blocks = self.volume.chain_blocks(head);
        if blocks.len() <= needed_blocks {
            return Ok(());
        }
        let keep = blocks[needed_blocks - 1];
        self.volume.fat_set(keep, pennos_abi::FAT_EOF);
        for &block in &blocks[needed_blocks..] {
            self.volume.fat_set(block, pennos_abi::FAT_FREE);
        }
        Ok(())
    }
}

fn new_file_entry(name: &str, now: i64) -> DirEntry {
    let mut entry = DirEntry::empty();
    set_name(&mut entry, name);
    entry.entry_type = ENTRY_TYPE_FILE;
    entry.perm = Permissions::READ_WRITE.bits();
    entry.mtime = now;
    entry
}

fn set_name(entry: &mut DirEntry, name: &str) {
    let bytes = name.as_bytes();
    let len = bytes.len().min(entry.name.len() - 1);
    entry.name = [0; 32];
    entry.name[..len].copy_from_slice(&bytes[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Volume;

    fn fresh_fs() -> (std::path::PathBuf, FileSystem) {
        let path = std::env::temp_dir().join(format!(
            "pennos-ops-test-{}-{}.fat",
            std::process::id(),
            std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().subsec_nanos()
        ));
        Volume::mkfs(&path, 2, 0).unwrap();
        let mut volume = Volume::mount(&path).unwrap();
        dir::init_root_directory(&mut volume).unwrap();
        (path, FileSystem::new(volume))
    }

    #[test]
    fn write_then_read_round_trips() {
        let (path, mut fs) = fresh_fs();
        let mut fds = FdTable::new();
        let fd = fs.open(&mut fds, "a.txt", OpenMode::Write, 0).unwrap();
        fs.write(&fds, fd, b"hello world").unwrap();
        fs.close(&mut fds, fd).unwrap();

        let fd = fs.open(&mut fds, "a.txt", OpenMode::Read, 0).unwrap();
        let mut buf = [0u8; 32];
        let n = fs.read(&fds, fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello world");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn append_grows_past_existing_content() {
        let (path, mut fs) = fresh_fs();
        let mut fds = FdTable::new();
        let fd = fs.open(&mut fds, "a.txt", OpenMode::Write, 0).unwrap();
        fs.write(&fds, fd, b"hello ").unwrap();
        fs.close(&mut fds, fd).unwrap();

        let fd = fs.open(&mut fds, "a.txt", OpenMode::Append, 0).unwrap();
        fs.write(&fds, fd, b"world").unwrap();
        fs.close(&mut fds, fd).unwrap();

        let fd = fs.open(&mut fds, "a.txt", OpenMode::Read, 0).unwrap();
        let mut buf = [0u8; 32];
        let n = fs.read(&fds, fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello world");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_truncates_shorter_content() {
        let (path, mut fs) = fresh_fs();
        let mut fds = FdTable::new();
        let fd = fs.open(&mut fds, "a.txt", OpenMode::Write, 0).unwrap();
        fs.write(&fds, fd, b"this is a long first write").unwrap();
        fs.close(&mut fds, fd).unwrap();

        let fd = fs.open(&mut fds, "a.txt", OpenMode::Write, 0).unwrap();
        fs.write(&fds, fd, b"short").unwrap();
        fs.close(&mut fds, fd).unwrap();

        let fd = fs.open(&mut fds, "a.txt", OpenMode::Read, 0).unwrap();
        let mut buf = [0u8; 64];
        let n = fs.read(&fds, fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"short");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unlink_frees_blocks_and_removes_entry() {
        let (path, mut fs) = fresh_fs();
        let mut fds = FdTable::new();
        let fd = fs.open(&mut fds, "a.txt", OpenMode::Write, 0).unwrap();
        fs.write(&fds, fd, b"data").unwrap();
        fs.close(&mut fds, fd).unwrap();

        fs.unlink("a.txt").unwrap();
        assert!(fs.ls().unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }
}
