//! FAT filesystem ABI types shared between `pennos-fs` and `pennos-core`.
//!
//! Layouts here mirror the on-disk format: the FAT region (entry 0 is the
//! packed superblock), the root directory's fixed-size entry chain, and the
//! global/per-process open-file tables.

use bitflags::bitflags;

// --- FAT superblock (packed into FAT entry 0) ---

/// Number of blocks used by the FAT region itself, 1..=32. Stored in the
/// upper byte of FAT entry 0.
pub type BlocksInFat = u8;

/// Block size codes 0..=4, stored in the lower byte of FAT entry 0, mapping
/// to the actual block size via [`block_size_for_code`].
pub const BLOCK_SIZE_CODE_MIN: u8 = 0;
pub const BLOCK_SIZE_CODE_MAX: u8 = 4;

pub const BLOCK_SIZES: [u16; 5] = [256, 512, 1024, 2048, 4096];

/// Resolve a block-size code (0..=4) to its block size in bytes.
pub const fn block_size_for_code(code: u8) -> Option<u16> {
    if code as usize >= BLOCK_SIZES.len() {
        None
    } else {
        Some(BLOCK_SIZES[code as usize])
    }
}

pub const MIN_BLOCKS_IN_FAT: u8 = 1;
pub const MAX_BLOCKS_IN_FAT: u8 = 32;

/// Each FAT entry is 16 bits wide.
pub type FatEntry = u16;

/// Sentinel marking a free (unallocated) block.
pub const FAT_FREE: FatEntry = 0x0000;
/// Sentinel marking the final block in a chain.
pub const FAT_EOF: FatEntry = 0xFFFF;

/// FAT index of the root directory's first block (by convention, the block
/// immediately after the FAT region's reserved entry 0/1 pair).
pub const ROOT_DIR_FAT_INDEX: u32 = 1;

// --- Directory entries ---

/// Size in bytes of one packed directory entry.
pub const DIR_ENTRY_SIZE: usize = 64;

/// Max length of a file name, including the NUL terminator.
pub const FILE_NAME_MAX: usize = 32;

/// Directory entry type byte.
pub const ENTRY_TYPE_UNUSED: u8 = 0;
pub const ENTRY_TYPE_FILE: u8 = 1;
pub const ENTRY_TYPE_DIRECTORY: u8 = 2;
pub const ENTRY_TYPE_END_OF_DIR: u8 = 4;
pub const ENTRY_TYPE_DELETED: u8 = 8;

bitflags! {
    /// File permission bits. Only {0, 2, 4, 5, 6, 7} are legal combinations
    /// (write-only-no-read is representable but execute-without-read is not
    /// meaningfully reachable through `chmod`'s transition table).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Permissions: u8 {
        const EXECUTE = 0b001;
        const WRITE   = 0b010;
        const READ    = 0b100;
    }
}

impl Permissions {
    pub const NONE: Self = Self::empty();
    pub const READ_WRITE_EXEC: Self = Self::READ.union(Self::WRITE).union(Self::EXECUTE);
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);
    pub const READ_EXEC: Self = Self::READ.union(Self::EXECUTE);
    pub const READ_ONLY: Self = Self::READ;
    pub const WRITE_ONLY: Self = Self::WRITE;

    /// A combination is reachable through `chmod` only if execute is never
    /// set without read: `{0, 2, 4, 5, 6, 7}`, excluding bare-exec (`1`) and
    /// write-exec (`3`).
    pub fn is_legal(&self) -> bool {
        !self.contains(Self::EXECUTE) || self.contains(Self::READ)
    }
}

/// An on-disk directory entry, packed to [`DIR_ENTRY_SIZE`] bytes.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; FILE_NAME_MAX],
    pub size: u32,
    pub first_block: u16,
    pub entry_type: u8,
    pub perm: u8,
    pub mtime: i64,
    pub reserved: [u8; 16],
}

impl DirEntry {
    pub const fn empty() -> Self {
        Self {
            name: [0; FILE_NAME_MAX],
            size: 0,
            first_block: 0,
            entry_type: ENTRY_TYPE_UNUSED,
            perm: 0,
            mtime: 0,
            reserved: [0; 16],
        }
    }

    pub fn name_str(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..len]).unwrap_or("<invalid>")
    }

    pub fn is_unused(&self) -> bool {
        self.entry_type == ENTRY_TYPE_UNUSED
    }

    pub fn is_end_of_dir(&self) -> bool {
        self.entry_type == ENTRY_TYPE_END_OF_DIR
    }
}

const _: () = assert!(core::mem::size_of::<DirEntry>() <= DIR_ENTRY_SIZE);

// --- Open file table ---

/// Number of slots in the global open-file table, shared by every process.
pub const GLOBAL_OFT_SIZE: usize = 1024;

/// Number of file-descriptor slots per process.
pub const MAX_FDS_PER_PROC: usize = 1024;

/// Reserved global-table slots wired to the host's stdio at boot.
pub const STDIN_FD: i32 = 0;
pub const STDOUT_FD: i32 = 1;
pub const STDERR_FD: i32 = 2;

/// File open modes (spec §6 / os_errors.h semantics).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    Read = 0,
    Write = 1,
    Append = 2,
}

/// `lseek` whence values.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    Set = 0,
    Cur = 1,
    End = 2,
}
