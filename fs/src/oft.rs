//! The global open-file table and per-process file-descriptor tables
//! (spec §3 Components C/D). Slots 0/1/2 of every process's FD table are
//! reserved for stdin/stdout/stderr and never route through this table —
//! `pennos-core` wires those directly to the host's stdio.

use pennos_abi::{OpenMode, GLOBAL_OFT_SIZE, MAX_FDS_PER_PROC, STDERR_FD, STDIN_FD, STDOUT_FD};

use crate::error::{FsError, FsResult};

/// One entry in the global open-file table: a directory slot, the mode it
/// was opened with, and the shared byte offset every fd referencing this
/// slot sees (matching the original's single-offset-per-open semantics,
/// not per-fd independent offsets).
#[derive(Clone, Copy, Debug)]
pub struct OpenFile {
    pub dir_slot: usize,
    pub mode: OpenMode,
    pub offset: u32,
    pub ref_count: u32,
}

#[derive(Default)]
pub struct GlobalOft {
    slots: Vec<Option<OpenFile>>,
}

impl GlobalOft {
    pub fn new() -> Self {
        Self { slots: vec![None; GLOBAL_OFT_SIZE] }
    }

    /// True if `dir_slot` is already open for writing/appending (the
    /// original forbids concurrent writers on the same file).
    pub fn has_writer(&self, dir_slot: usize) -> bool {
        self.slots.iter().flatten().any(|f| f.dir_slot == dir_slot && f.mode != OpenMode::Read)
    }

    pub fn open(&mut self, dir_slot: usize, mode: OpenMode, offset: u32) -> FsResult<usize> {
        if let Some(index) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[index] = Some(OpenFile { dir_slot, mode, offset, ref_count: 1 });
            Ok(index)
        } else {
            Err(FsError::FdTableFull)
        }
    }

    pub fn get(&self, index: usize) -> FsResult<&OpenFile> {
        self.slots.get(index).and_then(|s| s.as_ref()).ok_or(FsError::BadFd(index as i32))
    }

    pub fn get_mut(&mut self, index: usize) -> FsResult<&mut OpenFile> {
        self.slots.get_mut(index).and_then(|s| s.as_mut()).ok_or(FsError::BadFd(index as i32))
    }

    /// Drop one reference; frees the slot once the last reference closes.
    pub fn close(&mut self, index: usize) -> FsResult<()> {
        let slot = self.slots.get_mut(index).ok_or(FsError::BadFd(index as i32))?;
        let file = slot.as_mut().ok_or(FsError::BadFd(index as i32))?;
        file.ref_count -= 1;
        if file.ref_count == 0 {
            *slot = None;
        }
        Ok(())
    }
}

/// A single process's view of open files: fd -> global OFT index.
pub struct FdTable {
    fds: Vec<Option<usize>>,
}

impl FdTable {
    pub fn new() -> Self {
        Self { fds: vec![None; MAX_FDS_PER_PROC] }
    }

    pub fn bind(&mut self, fd: i32, oft_index: usize) -> FsResult<()> {
        let slot = self.fds.get_mut(fd as usize).ok_or(FsError::BadFd(fd))?;
        *slot = Some(oft_index);
        Ok(())
    }

    /// Allocate the lowest free fd at or above 3 (0/1/2 are reserved for
    /// stdio and never handed out here) and bind it.
    pub fn allocate(&mut self, oft_index: usize) -> FsResult<i32> {
        let reserved = [STDIN_FD, STDOUT_FD, STDERR_FD];
        for (fd, slot) in self.fds.iter_mut().enumerate() {
            if reserved.contains(&(fd as i32)) {
                continue;
            }
            if slot.is_none() {
                *slot = Some(oft_index);
                return Ok(fd as i32);
            }
        }
        Err(FsError::FdTableFull)
    }

    pub fn oft_index(&self, fd: i32) -> FsResult<usize> {
        self.fds
            .get(fd as usize)
            .and_then(|s| *s)
            .ok_or(FsError::BadFd(fd))
    }

    pub fn release(&mut self, fd: i32) -> FsResult<usize> {
        let slot = self.fds.get_mut(fd as usize).ok_or(FsError::BadFd(fd))?;
        slot.take().ok_or(FsError::BadFd(fd))
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_skips_reserved_fds() {
        let mut table = FdTable::new();
        let fd = table.allocate(0).unwrap();
        assert!(fd >= 3);
    }

    #[test]
    fn close_frees_slot_only_at_zero_refcount() {
        let mut oft = GlobalOft::new();
        let index = oft.open(5, OpenMode::Read, 0).unwrap();
        oft.get_mut(index).unwrap().ref_count = 2;
        oft.close(index).unwrap();
        assert!(oft.get(index).is_ok());
        oft.close(index).unwrap();
        assert!(oft.get(index).is_err());
    }
}
