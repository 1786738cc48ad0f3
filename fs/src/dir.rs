//! The root directory: a chain of fixed-size [`DirEntry`] records stored in
//! data blocks, terminated by an `END_OF_DIR` sentinel entry. PennOS has no
//! subdirectories, so this is the entire namespace.
//!
//! Grounded in `fat_helper.c`'s `k_open_entry`, `k_file_exists`,
//! `k_ls_all`, and `k_unlink`'s delete/promote logic.

use pennos_abi::{DirEntry, DIR_ENTRY_SIZE, ENTRY_TYPE_DELETED, ENTRY_TYPE_END_OF_DIR, ENTRY_TYPE_UNUSED};

use crate::error::{FsError, FsResult};
use crate::volume::Volume;

fn entries_per_block(volume: &Volume) -> usize {
    volume.block_size() as usize / DIR_ENTRY_SIZE
}

fn pack(entry: &DirEntry) -> [u8; DIR_ENTRY_SIZE] {
    let mut buf = [0u8; DIR_ENTRY_SIZE];
    buf[0..32].copy_from_slice(&entry.name);
    buf[32..36].copy_from_slice(&entry.size.to_le_bytes());
    buf[36..38].copy_from_slice(&entry.first_block.to_le_bytes());
    buf[38] = entry.entry_type;
    buf[39] = entry.perm;
    buf[40..48].copy_from_slice(&entry.mtime.to_le_bytes());
    buf
}

fn unpack(buf: &[u8]) -> DirEntry {
    let mut name = [0u8; 32];
    name.copy_from_slice(&buf[0..32]);
    DirEntry {
        name,
        size: u32::from_le_bytes(buf[32..36].try_into().unwrap()),
        first_block: u16::from_le_bytes(buf[36..38].try_into().unwrap()),
        entry_type: buf[38],
        perm: buf[39],
        mtime: i64::from_le_bytes(buf[40..48].try_into().unwrap()),
        reserved: [0u8; 16],
    }
}

/// Read the directory entry at flat index `slot` across the root
/// directory's block chain, extending the chain with fresh blocks if
/// `slot` falls past its current end (used when appending new entries).
fn entry_offset(volume: &Volume, slot: usize) -> (usize, usize) {
    let per_block = entries_per_block(volume);
    (slot / per_block, slot % per_block)
}

fn nth_block(volume: &mut Volume, chain_index: usize) -> FsResult<u32> {
    let head = volume.root_dir_first_block();
    let mut blocks = volume.chain_blocks(head);
    while blocks.len() <= chain_index {
        let tail = *blocks.last().unwrap();
        let new_block = volume.extend_chain(tail)?;
        blocks.push(new_block);
    }
    Ok(blocks[chain_index])
}

pub fn read_slot(volume: &mut Volume, slot: usize) -> FsResult<DirEntry> {
    let (chain_index, within) = entry_offset(volume, slot);
    let head = volume.root_dir_first_block();
    let blocks = volume.chain_blocks(head);
    if chain_index >= blocks.len() {
        return Ok(DirEntry::empty());
    }
    let block = blocks[chain_index];
    let data = volume.read_block(block);
    let start = within * DIR_ENTRY_SIZE;
    Ok(unpack(&data[start..start + DIR_ENTRY_SIZE]))
}

pub fn write_slot(volume: &mut Volume, slot: usize, entry: &DirEntry) -> FsResult<()> {
    let (chain_index, within) = entry_offset(volume, slot);
    let block = nth_block(volume, chain_index)?;
    let data = volume.write_block(block);
    let start = within * DIR_ENTRY_SIZE;
    data[start..start + DIR_ENTRY_SIZE].copy_from_slice(&pack(entry));
    Ok(())
}

/// Write the sentinel entry that marks the logical end of the directory.
pub fn init_root_directory(volume: &mut Volume) -> FsResult<()> {
    let mut end = DirEntry::empty();
    end.entry_type = ENTRY_TYPE_END_OF_DIR;
    write_slot(volume, 0, &end)
}

/// Every live (non-deleted, non-unused) entry with its flat slot index,
/// stopping at the first `END_OF_DIR` sentinel.
pub fn list_live_entries(volume: &mut Volume) -> FsResult<Vec<(usize, DirEntry)>> {
    let mut out = Vec::new();
    let mut slot = 0;
    loop {
        let entry = read_slot(volume, slot)?;
        if entry.is_end_of_dir() {
            break;
        }
        if !entry.is_unused() && entry.entry_type != ENTRY_TYPE_DELETED {
            out.push((slot, entry));
        }
        slot += 1;
    }
    Ok(out)
}

pub fn find_by_name(volume: &mut Volume, name: &str) -> FsResult<Option<(usize, DirEntry)>> {
    Ok(list_live_entries(volume)?.into_iter().find(|(_, e)| e.name_str() == name))
}

/// Find the first slot usable for a new entry: a deleted (reusable) slot if
/// one exists before the terminator, otherwise the terminator's own slot
/// (which becomes the new entry, with the terminator pushed one slot
/// further out).
pub fn alloc_entry_slot(volume: &mut Volume, name: &str) -> FsResult<usize> {
    if find_by_name(volume, name)?.is_some() {
        return Err(FsError::AlreadyExists(name.to_string()));
    }
    let mut slot = 0;
    loop {
        let entry = read_slot(volume, slot)?;
        if entry.entry_type == ENTRY_TYPE_DELETED {
            return Ok(slot);
        }
        if entry.is_end_of_dir() {
            let terminator = DirEntry { entry_type: ENTRY_TYPE_END_OF_DIR, ..DirEntry::empty() };
            write_slot(volume, slot + 1, &terminator)?;
            return Ok(slot);
        }
        slot += 1;
    }
}

/// Remove the entry at `slot`. If it is immediately followed by the
/// terminator, the terminator is promoted into `slot` (keeping the live
/// region contiguous); otherwise `slot` is marked deleted and reused by a
/// later `alloc_entry_slot`.
pub fn remove_slot(volume: &mut Volume, slot: usize) -> FsResult<()> {
    let next = read_slot(volume, slot + 1)?;
    if next.is_end_of_dir() {
        write_slot(volume, slot, &next)
    } else {
        let mut deleted = read_slot(volume, slot)?;
        deleted.entry_type = ENTRY_TYPE_DELETED;
        write_slot(volume, slot, &deleted)
    }
}

pub const _: usize = ENTRY_TYPE_UNUSED as usize;

#[cfg(test)]
mod tests {
    use super::*;
    use pennos_abi::ENTRY_TYPE_FILE;

    fn fresh_volume() -> (std::path::PathBuf, Volume) {
        let path = std::env::temp_dir().join(format!("pennos-dir-test-{}-{}.fat", std::process::id(), rand_suffix()));
        Volume::mkfs(&path, 2, 0).unwrap();
        let mut volume = Volume::mount(&path).unwrap();
        init_root_directory(&mut volume).unwrap();
        (path, volume)
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64
    }

    #[test]
    fn alloc_then_list_then_remove() {
        let (path, mut volume) = fresh_volume();
        let slot = alloc_entry_slot(&mut volume, "a.txt").unwrap();
        let mut entry = DirEntry::empty();
        entry.name[..5].copy_from_slice(b"a.txt");
        entry.entry_type = ENTRY_TYPE_FILE;
        write_slot(&mut volume, slot, &entry).unwrap();

        let live = list_live_entries(&mut volume).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].1.name_str(), "a.txt");

        remove_slot(&mut volume, slot).unwrap();
        assert!(list_live_entries(&mut volume).unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }
}
