//! The FAT volume: a single host file, memory-mapped, holding the FAT
//! region (entry 0 packs the superblock) followed by the data region
//! (block 1 is always the root directory's first block).
//!
//! Grounded in `original_source/src/fat/fat_helper.c`'s `mount()`/`mkfs`
//! path and block-chain helpers.

use std::fs::OpenOptions;
use std::path::Path;

use memmap2::MmapMut;
use pennos_abi::{
    block_size_for_code, FatEntry, BlocksInFat, FAT_EOF, FAT_FREE, MAX_BLOCKS_IN_FAT,
    MIN_BLOCKS_IN_FAT, ROOT_DIR_FAT_INDEX,
};

use crate::error::{FsError, FsResult};

/// Number of addressable data blocks for a given FAT geometry. At the
/// largest geometry (4096-byte blocks, 32 blocks in FAT) a full
/// `(fat_entry_count - 1)`-block data region would need chain-pointer
/// values that overflow the 16-bit FAT entry (`32*4096/2 = 65536 >
/// 0xFFFF`), so that one geometry shrinks the data region by one
/// additional block (`original_source/src/pennfat.c:111-112`).
fn data_block_count(fat_entry_count: u32, blocks_in_fat: BlocksInFat, block_size: u16) -> u32 {
    let count = fat_entry_count.saturating_sub(1);
    if block_size == 4096 && blocks_in_fat == MAX_BLOCKS_IN_FAT {
        count.saturating_sub(1)
    } else {
        count
    }
}

/// A mounted FAT volume backed by a memory-mapped host file.
pub struct Volume {
    mmap: MmapMut,
    block_size: u16,
    blocks_in_fat: BlocksInFat,
    /// Exclusive upper bound on addressable block indices (one past the
    /// last valid data block).
    block_index_bound: u32,
}

impl Volume {
    /// Format a new volume at `path`. `blocks_in_fat` must be in `1..=32`
    /// and `block_size_code` in `0..=4`.
    pub fn mkfs(path: impl AsRef<Path>, blocks_in_fat: BlocksInFat, block_size_code: u8) -> FsResult<()> {
        if !(MIN_BLOCKS_IN_FAT..=MAX_BLOCKS_IN_FAT).contains(&blocks_in_fat) {
            return Err(FsError::InvalidArgument(format!(
                "blocks_in_fat must be in {MIN_BLOCKS_IN_FAT}..={MAX_BLOCKS_IN_FAT}, got {blocks_in_fat}"
            )));
        }
        let block_size = block_size_for_code(block_size_code)
            .ok_or_else(|| FsError::InvalidArgument(format!("invalid block size code {block_size_code}")))?;

        let fat_region_size = blocks_in_fat as u64 * block_size as u64;
        let fat_entry_count = (fat_region_size / 2) as u32;
        let data_region_size = data_block_count(fat_entry_count, blocks_in_fat, block_size) as u64 * block_size as u64;
        let total_size = fat_region_size + data_region_size;

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len(total_size)?;

        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        // FAT entry 0: superblock. Upper byte = blocks_in_fat, lower byte = block size code.
        let superblock = ((blocks_in_fat as u16) << 8) | block_size_code as u16;
        write_u16(&mut mmap, 0, superblock);
        // FAT entry 1: root directory's sole (initially empty) block, EOF-terminated.
        write_u16(&mut mmap, 2, FAT_EOF);
        mmap.flush()?;
        Ok(())
    }

    /// Open an existing volume, reading the packed superblock from FAT
    /// entry 0 to determine geometry.
    pub fn mount(path: impl AsRef<Path>) -> FsResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        if mmap.len() < 4 {
            return Err(FsError::InvalidArgument("volume too small to contain a superblock".into()));
        }
        let superblock = read_u16(&mmap, 0);
        let blocks_in_fat = (superblock >> 8) as u8;
        let block_size_code = (superblock & 0xFF) as u8;
        let block_size = block_size_for_code(block_size_code)
            .ok_or_else(|| FsError::InvalidArgument(format!("corrupt superblock: bad block size code {block_size_code}")))?;
        if !(MIN_BLOCKS_IN_FAT..=MAX_BLOCKS_IN_FAT).contains(&blocks_in_fat) {
            return Err(FsError::InvalidArgument(format!(
                "corrupt superblock: bad blocks_in_fat {blocks_in_fat}"
            )));
        }
        let fat_entry_count = (blocks_in_fat as u64 * block_size as u64 / 2) as u32;
        let block_index_bound = data_block_count(fat_entry_count, blocks_in_fat, block_size) + ROOT_DIR_FAT_INDEX;
        Ok(Self {
            mmap,
            block_size,
            blocks_in_fat,
            block_index_bound,
        })
    }

    pub fn block_size(&self) -> u16 {
        self.block_size
    }

    pub fn blocks_in_fat(&self) -> BlocksInFat {
        self.blocks_in_fat
    }

    pub fn root_dir_first_block(&self) -> u32 {
        ROOT_DIR_FAT_INDEX
    }

    fn fat_region_size(&self) -> u64 {
        self.blocks_in_fat as u64 * self.block_size as u64
    }

    pub fn fat_get(&self, index: u32) -> FatEntry {
        read_u16(&self.mmap, index as usize * 2)
    }

    pub fn fat_set(&mut self, index: u32, value: FatEntry) {
        write_u16(&mut self.mmap, index as usize * 2, value);
    }

    /// Byte offset of the start of data block `index` (index 1 is the
    /// root directory's first block).
    fn block_offset(&self, index: u32) -> u64 {
        self.fat_region_size() + (index as u64 - 1) * self.block_size as u64
    }

    pub fn read_block(&self, index: u32) -> &[u8] {
        let offset = self.block_offset(index) as usize;
        &self.mmap[offset..offset + self.block_size as usize]
    }

    pub fn write_block(&mut self, index: u32) -> &mut [u8] {
        let offset = self.block_offset(index) as usize;
        let size = self.block_size as usize;
        &mut self.mmap[offset..offset + size]
    }

    /// Scan for the first free block (a FAT entry of [`FAT_FREE`]),
    /// starting after the reserved root-directory entry.
    pub fn alloc_block(&mut self) -> FsResult<u32> {
        for index in (ROOT_DIR_FAT_INDEX + 1)..self.block_index_bound {
            if self.fat_get(index) == FAT_FREE {
                self.fat_set(index, FAT_EOF);
                return Ok(index);
            }
        }
        Err(FsError::VolumeFull)
    }

    /// Free every block in the chain starting at `head`.
    pub fn free_chain(&mut self, head: u32) {
        let mut current = head;
        loop {
            let next = self.fat_get(current);
            self.fat_set(current, FAT_FREE);
            if next == FAT_EOF || next == FAT_FREE {
                break;
            }
            current = next as u32;
        }
    }

    /// Append a freshly allocated block to the end of the chain starting
    /// at `head`, returning the new block's index.
    pub fn extend_chain(&mut self, head: u32) -> FsResult<u32> {
        let mut tail = head;
        while self.fat_get(tail) != FAT_EOF {
            tail = self.fat_get(tail) as u32;
        }
        let new_block = self.alloc_block()?;
        self.fat_set(tail, new_block as FatEntry);
        Ok(new_block)
    }

    pub fn chain_blocks(&self, head: u32) -> Vec<u32> {
        let mut blocks = Vec::new();
        let mut current = head;
        loop {
            blocks.push(current);
            let next = self.fat_get(current);
            if next == FAT_EOF || next == FAT_FREE {
                break;
            }
            current = next as u32;
        }
        blocks
    }

    pub fn flush(&self) -> FsResult<()> {
        self.mmap.flush()?;
        Ok(())
    }
}

fn read_u16(mmap: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([mmap[offset], mmap[offset + 1]])
}

fn write_u16(mmap: &mut [u8], offset: usize, value: u16) {
    let bytes = value.to_le_bytes();
    mmap[offset] = bytes[0];
    mmap[offset + 1] = bytes[1];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkfs_then_mount_round_trips_geometry() {
        let path = std::env::temp_dir().join(format!("pennos-fs-test-{}.fat", std::process::id()));
        Volume::mkfs(&path, 2, 2).unwrap();
        let volume = Volume::mount(&path).unwrap();
        assert_eq!(volume.block_size(), 1024);
        assert_eq!(volume.blocks_in_fat(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn alloc_and_free_chain_round_trips() {
        let path = std::env::temp_dir().join(format!("pennos-fs-test-{}.fat", std::process::id() as u64 + 1));
        Volume::mkfs(&path, 2, 0).unwrap();
        let mut volume = Volume::mount(&path).unwrap();
        let a = volume.alloc_block().unwrap();
        let b = volume.extend_chain(a).unwrap();
        assert_ne!(a, b);
        assert_eq!(volume.chain_blocks(a), vec![a, b]);
        volume.free_chain(a);
        assert_eq!(volume.fat_get(a), FAT_FREE);
        assert_eq!(volume.fat_get(b), FAT_FREE);
        std::fs::remove_file(&path).ok();
    }
}
