//! The FAT-style filesystem: a single host file holding a FAT region and a
//! flat (single-directory) namespace of files, exposed through the
//! filesystem syscalls of spec §6.
//!
//! Mirrors the role of the teacher's `fs` crate (which hosts its
//! ext2/ramfs/vfs glue) — here there is exactly one on-disk format, so
//! there's no `vfs` trait layer to dispatch through.

pub mod dir;
pub mod error;
pub mod oft;
pub mod ops;
pub mod volume;

pub use error::{FsError, FsResult};
pub use oft::FdTable;
pub use ops::FileSystem;
pub use volume::Volume;

use std::path::Path;

/// Format a new volume at `path` and initialize its (empty) root
/// directory. Combines [`Volume::mkfs`] with the directory-level
/// initialization `mkfs` alone can't perform (it doesn't know the
/// directory-entry layout).
pub fn mkfs(path: impl AsRef<Path>, blocks_in_fat: u8, block_size_code: u8) -> FsResult<()> {
    Volume::mkfs(&path, blocks_in_fat, block_size_code)?;
    let mut volume = Volume::mount(&path)?;
    dir::init_root_directory(&mut volume)?;
    volume.flush()
}

/// Mount an existing volume, ready for use via [`FileSystem`].
pub fn mount(path: impl AsRef<Path>) -> FsResult<FileSystem> {
    let volume = Volume::mount(path)?;
    Ok(FileSystem::new(volume))
}
