//! exFAT directory/cluster walker
//!
//! Grounded in `exfat_dir.c`'s `exfat_dir`/`dir_exfat_aux` from the original
//! implementation this spec was distilled from: enumerate the root
//! directory's cluster chain into one buffer, then walk it 32 bytes at a
//! time assembling `File`/`StreamExtension`/`FileNameExtension` triples
//! (spec section 4.6). Recast in the teacher's style — an `Arc<R:
//! BlockDeviceReader>`-holding parser returning domain entities, as
//! `NtfsParser` does for MFT records.

use super::boot_sector::{ExfatBootSector, BOOT_SECTOR_SIZE};
use crate::domain::repositories::{
    BlockSource, DirectoryEntry, FileSystemError, FileSystemParser, FileSystemType,
};
use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

/// Directory entries are enumerated in chunks of one cluster-run at a
/// time, bounded to this many clusters (spec section 4.6).
const NBR_CLUSTER_MAX: u32 = 30;
const ENTRY_SIZE: usize = 32;
const EOC: u32 = 0xFFFFFFFF;

const ENTRY_TYPE_FILE: u8 = 0x05;
const ENTRY_TYPE_STREAM_EXT: u8 = 0x40;
const ENTRY_TYPE_NAME_EXT: u8 = 0x41;

/// Cluster-chain follow strategy. May only demote (FollowCluster ->
/// NextCluster, or FollowCluster -> NextFreeCluster), never upgrade
/// (spec section 4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClusterMethod {
    FollowCluster,
    NextFreeCluster,
    NextCluster,
}

/// A parsed exFAT directory entry before its secondary entries (stream
/// extension, name extensions) have been folded in.
struct PendingFile {
    entry_offset: u64,
    is_live: bool,
    secondary_remaining: u8,
    size: u64,
    first_cluster: u32,
    created: u32,
    modified: u32,
    accessed: u32,
    name: String,
}

/// exFAT file system parser.
pub struct ExfatWalker<S: BlockSource> {
    source: Arc<S>,
    boot_sector: ExfatBootSector,
    list_deleted: bool,
}

impl<S: BlockSource> ExfatWalker<S> {
    /// Reads and validates the boot sector at partition offset 0.
    pub fn new(source: Arc<S>, list_deleted: bool) -> Result<Self, FileSystemError> {
        let mut data = vec![0u8; BOOT_SECTOR_SIZE];
        read_exact(&*source, 0, &mut data)?;
        let boot_sector = ExfatBootSector::parse(&data)?;
        Ok(Self { source, boot_sector, list_deleted })
    }

    /// Reads the FAT entry for `cluster`, if present.
    fn fat_entry(&self, cluster: u32) -> Option<u32> {
        let offset = self.boot_sector.fat_offset_bytes() + (cluster as u64) * 4;
        if offset + 4 > self.boot_sector.fat_offset_bytes() + self.boot_sector.fat_length_bytes() {
            return None;
        }
        let mut buf = [0u8; 4];
        read_exact(&*self.source, offset, &mut buf).ok()?;
        Some(LittleEndian::read_u32(&buf))
    }

    /// Advances the cluster cursor per the active strategy, demoting it
    /// if the FAT turns out to be unusable.
    fn advance_cluster(&self, method: &mut ClusterMethod, cluster: u32, first_cluster: u32) -> Option<u32> {
        if *method == ClusterMethod::FollowCluster {
            match self.fat_entry(cluster) {
                Some(next) if next == EOC => return Some(EOC),
                Some(next) if next >= 2 && next <= self.boot_sector.total_clusters() + 1 => {
                    return Some(next);
                }
                Some(0) if cluster == first_cluster && self.list_deleted => {
                    *method = ClusterMethod::NextFreeCluster;
                }
                Some(0) => return None,
                _ => *method = ClusterMethod::NextCluster,
            }
        }

        match method {
            ClusterMethod::FollowCluster => unreachable!(),
            ClusterMethod::NextCluster => Some(cluster + 1),
            ClusterMethod::NextFreeCluster => {
                let mut candidate = cluster + 1;
                while candidate < self.boot_sector.total_clusters() + 2 {
                    match self.fat_entry(candidate) {
                        Some(0) => return Some(candidate),
                        Some(_) => candidate += 1,
                        None => return None,
                    }
                }
                None
            }
        }
    }

    /// Reads up to `NBR_CLUSTER_MAX` clusters of a chain starting at
    /// `first_cluster` into one contiguous buffer.
    fn read_cluster_chain(&self, first_cluster: u32, max_clusters: u32) -> Result<Vec<u8>, FileSystemError> {
        let cluster_size = self.boot_sector.cluster_size() as usize;
        let mut out = Vec::new();
        let mut cluster = first_cluster;
        let mut method = ClusterMethod::FollowCluster;
        let mut count = 0;

        while cluster != EOC && cluster >= 2 && count < max_clusters {
            let offset = self.boot_sector.cluster_offset(cluster);
            let mut buf = vec![0u8; cluster_size];
            if read_exact(&*self.source, offset, &mut buf).is_err() {
                break;
            }
            out.extend_from_slice(&buf);
            count += 1;

            match self.advance_cluster(&mut method, cluster, first_cluster) {
                Some(next) => cluster = next,
                None => break,
            }
        }

        Ok(out)
    }

    /// Root-directory analog of `dir_exfat_aux`: walks 32-byte records,
    /// folding stream-extension and name-extension entries into the
    /// preceding File entry.
    fn parse_directory(&self, data: &[u8], include_deleted: bool) -> Vec<DirectoryEntry> {
        let mut entries = Vec::new();
        let mut current: Option<PendingFile> = None;

        for (index, chunk) in data.chunks_exact(ENTRY_SIZE).enumerate() {
            let entry_offset = (index * ENTRY_SIZE) as u64;
            let raw_type = chunk[0];
            let is_live = raw_type & 0x80 != 0;
            let masked = raw_type & 0x7F;

            if !is_live && !self.list_deleted && !include_deleted {
                continue;
            }

            if masked == ENTRY_TYPE_FILE {
                if let Some(pending) = current.take() {
                    entries.push(finish_entry(pending));
                }
                current = Some(PendingFile {
                    entry_offset,
                    is_live,
                    secondary_remaining: chunk[1],
                    size: 0,
                    first_cluster: 0,
                    created: LittleEndian::read_u32(&chunk[8..12]),
                    modified: LittleEndian::read_u32(&chunk[12..16]),
                    accessed: LittleEndian::read_u32(&chunk[16..20]),
                    name: String::new(),
                });
                continue;
            }

            let Some(pending) = current.as_mut() else { continue };
            if pending.secondary_remaining == 0 {
                continue;
            }

            match masked {
                ENTRY_TYPE_STREAM_EXT => {
                    pending.first_cluster = LittleEndian::read_u32(&chunk[20..24]);
                    pending.size = LittleEndian::read_u64(&chunk[24..32]);
                }
                ENTRY_TYPE_NAME_EXT => {
                    let units: Vec<u16> = chunk[2..32]
                        .chunks_exact(2)
                        .map(LittleEndian::read_u16)
                        .take_while(|&u| u != 0)
                        .collect();
                    pending.name.push_str(&String::from_utf16_lossy(&units));
                }
                _ => {}
            }
            pending.secondary_remaining -= 1;
        }

        if let Some(pending) = current.take() {
            entries.push(finish_entry(pending));
        }

        if !include_deleted {
            entries.retain(|e| e.is_live);
        }
        entries
    }
}

fn finish_entry(pending: PendingFile) -> DirectoryEntry {
    DirectoryEntry {
        entry_offset: pending.entry_offset,
        filename: if pending.name.is_empty() { None } else { Some(pending.name) },
        size: pending.size,
        first_cluster: pending.first_cluster,
        created: pending.created,
        modified: pending.modified,
        accessed: pending.accessed,
        is_live: pending.is_live,
        data_blocks: Vec::new(),
    }
}

fn read_exact<S: BlockSource>(source: &S, offset: u64, buf: &mut [u8]) -> Result<(), FileSystemError> {
    let n = source
        .read(offset, buf)
        .map_err(|e| FileSystemError::ReadError(e.to_string()))?;
    if n != buf.len() {
        return Err(FileSystemError::ReadError(format!(
            "short read at offset {offset}: wanted {} bytes, got {n}",
            buf.len()
        )));
    }
    Ok(())
}

impl<S: BlockSource> FileSystemParser for ExfatWalker<S> {
    fn detect_type(&self) -> Result<FileSystemType, FileSystemError> {
        Ok(FileSystemType::ExFat)
    }

    fn list_entries(&self, include_deleted: bool) -> Result<Vec<DirectoryEntry>, FileSystemError> {
        let data = self.read_cluster_chain(self.boot_sector.rootdir_cluster(), NBR_CLUSTER_MAX)?;
        let mut entries = self.parse_directory(&data, include_deleted);
        for entry in &mut entries {
            if entry.first_cluster >= 2 {
                let cluster_size = self.boot_sector.cluster_size();
                let clusters_needed = entry.size.div_ceil(cluster_size).max(1) as u32;
                let chain = self.follow_data_chain(entry.first_cluster, clusters_needed.min(NBR_CLUSTER_MAX * 64));
                entry.data_blocks = chain;
            }
        }
        Ok(entries)
    }

    fn read_entry_data(&self, entry: &DirectoryEntry) -> Result<Vec<u8>, FileSystemError> {
        if entry.first_cluster < 2 {
            return Err(FileSystemError::CorruptedMetadata(
                "entry has no data cluster".to_string(),
            ));
        }

        let cluster_size = self.boot_sector.cluster_size() as usize;
        let mut data = Vec::with_capacity(entry.size as usize);
        let mut remaining = entry.size;

        let clusters = if entry.data_blocks.is_empty() {
            let needed = (entry.size as usize).div_ceil(cluster_size).max(1) as u32;
            self.follow_data_chain(entry.first_cluster, needed)
        } else {
            entry.data_blocks.clone()
        };

        for cluster in clusters {
            if remaining == 0 {
                break;
            }
            let offset = self.boot_sector.cluster_offset(cluster as u32);
            let mut buf = vec![0u8; cluster_size];
            read_exact(&*self.source, offset, &mut buf)?;
            let take = (remaining as usize).min(cluster_size);
            data.extend_from_slice(&buf[..take]);
            remaining -= take as u64;
        }

        Ok(data)
    }

    fn filesystem_type(&self) -> FileSystemType {
        FileSystemType::ExFat
    }

    fn is_healthy(&self) -> bool {
        self.boot_sector.total_clusters() > 0
    }
}

impl<S: BlockSource> ExfatWalker<S> {
    /// File-data analog of `read_cluster_chain`: returns the absolute
    /// cluster numbers of a chain rather than their contents, bounded to
    /// `max_clusters` and the same EOC/`<2`/I-O-error stop conditions.
    fn follow_data_chain(&self, first_cluster: u32, max_clusters: u32) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cluster = first_cluster;
        let mut method = ClusterMethod::FollowCluster;
        let mut count = 0;

        while cluster != EOC && cluster >= 2 && count < max_clusters {
            out.push(cluster as u64);
            count += 1;
            match self.advance_cluster(&mut method, cluster, first_cluster) {
                Some(next) => cluster = next,
                None => break,
            }
        }
        out
    }
}
