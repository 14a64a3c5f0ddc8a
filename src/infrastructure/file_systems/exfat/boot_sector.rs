//! exFAT boot sector
//!
//! Grounded in the teacher's `NtfsBootSector`: a run of fixed-offset
//! little-endian fields read off a `Cursor`, validated, then exposed as
//! derived quantities (cluster size, offsets) rather than raw fields
//! (spec section 4.6 / section 6).

use crate::domain::repositories::FileSystemError;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// exFAT OEM name field, "EXFAT   " (bytes 3..11 of the boot sector).
const EXFAT_OEM_ID: [u8; 8] = *b"EXFAT   ";

/// Boot sector size in bytes.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Offset of the `0xAA55` end-of-sector signature.
const SIGNATURE_OFFSET: usize = 510;
const SIGNATURE: u16 = 0xAA55;

/// exFAT boot sector fields (spec section 6's cited subset).
#[derive(Debug)]
pub struct ExfatBootSector {
    oem_id: [u8; 8],
    fat_offset: u32,
    fat_length: u32,
    /// `clus_blocknr`: cluster heap offset, in sectors.
    clus_blocknr: u32,
    /// `total_clusters`: number of clusters in the cluster heap.
    total_clusters: u32,
    /// `rootdir_clusnr`: first cluster of the root directory.
    rootdir_clusnr: u32,
    /// `blocksize_bits`: log2 of the sector size.
    blocksize_bits: u8,
    /// `block_per_clus_bits`: log2 of sectors per cluster.
    block_per_clus_bits: u8,
}

impl ExfatBootSector {
    /// Parses and validates a 512-byte exFAT boot sector.
    pub fn parse(data: &[u8]) -> Result<Self, FileSystemError> {
        if data.len() < BOOT_SECTOR_SIZE {
            return Err(FileSystemError::InvalidBootSector(
                "exFAT boot sector too small".to_string(),
            ));
        }

        let signature = LittleEndian::read_u16(&data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 2]);
        if signature != SIGNATURE {
            return Err(FileSystemError::InvalidBootSector(format!(
                "bad end-of-sector signature: {:#06x}",
                signature
            )));
        }

        let mut oem_id = [0u8; 8];
        oem_id.copy_from_slice(&data[3..11]);
        if oem_id != EXFAT_OEM_ID {
            return Err(FileSystemError::InvalidBootSector(
                "OEM id is not \"EXFAT   \"".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);
        cursor.set_position(80);
        let fat_offset = read_u32(&mut cursor)?;
        let fat_length = read_u32(&mut cursor)?;
        let clus_blocknr = read_u32(&mut cursor)?;
        let total_clusters = read_u32(&mut cursor)?;
        let rootdir_clusnr = read_u32(&mut cursor)?;

        cursor.set_position(108);
        let blocksize_bits = cursor
            .read_u8()
            .map_err(|e| FileSystemError::InvalidBootSector(e.to_string()))?;
        let block_per_clus_bits = cursor
            .read_u8()
            .map_err(|e| FileSystemError::InvalidBootSector(e.to_string()))?;

        let boot_sector = Self {
            oem_id,
            fat_offset,
            fat_length,
            clus_blocknr,
            total_clusters,
            rootdir_clusnr,
            blocksize_bits,
            block_per_clus_bits,
        };

        if !boot_sector.is_valid() {
            return Err(FileSystemError::InvalidBootSector(
                "cluster geometry out of range".to_string(),
            ));
        }

        Ok(boot_sector)
    }

    fn is_valid(&self) -> bool {
        self.oem_id == EXFAT_OEM_ID
            && self.blocksize_bits >= 9
            && self.blocksize_bits <= 12
            && self.block_per_clus_bits <= 25
            && self.total_clusters > 0
    }

    /// `cluster_shift = block_per_clus_bits + blocksize_bits` (spec section 4.6).
    pub fn cluster_shift(&self) -> u32 {
        self.block_per_clus_bits as u32 + self.blocksize_bits as u32
    }

    pub fn sector_size(&self) -> u64 {
        1u64 << self.blocksize_bits
    }

    pub fn cluster_size(&self) -> u64 {
        1u64 << self.cluster_shift()
    }

    pub fn rootdir_cluster(&self) -> u32 {
        self.rootdir_clusnr
    }

    pub fn total_clusters(&self) -> u32 {
        self.total_clusters
    }

    /// Absolute byte offset of cluster number `cluster` (clusters 0/1 are
    /// reserved; the heap starts at cluster 2).
    pub fn cluster_offset(&self, cluster: u32) -> u64 {
        (self.clus_blocknr as u64) * self.sector_size()
            + (cluster as u64 - 2) * self.cluster_size()
    }

    /// Absolute byte offset of the start of the FAT.
    pub fn fat_offset_bytes(&self) -> u64 {
        self.fat_offset as u64 * self.sector_size()
    }

    pub fn fat_length_bytes(&self) -> u64 {
        self.fat_length as u64 * self.sector_size()
    }
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, FileSystemError> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| FileSystemError::InvalidBootSector(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_sector_bytes() -> Vec<u8> {
        let mut data = vec![0u8; BOOT_SECTOR_SIZE];
        data[3..11].copy_from_slice(b"EXFAT   ");
        LittleEndian::write_u32(&mut data[80..84], 1); // fat_offset
        LittleEndian::write_u32(&mut data[84..88], 2); // fat_length
        LittleEndian::write_u32(&mut data[88..92], 10); // clus_blocknr
        LittleEndian::write_u32(&mut data[92..96], 1000); // total_clusters
        LittleEndian::write_u32(&mut data[96..100], 5); // rootdir_clusnr
        data[108] = 9; // blocksize_bits (512)
        data[109] = 3; // block_per_clus_bits (4096-byte clusters)
        LittleEndian::write_u16(&mut data[510..512], SIGNATURE);
        data
    }

    #[test]
    fn parse_reads_cluster_geometry() {
        let data = boot_sector_bytes();
        let boot_sector = ExfatBootSector::parse(&data).unwrap();
        assert_eq!(boot_sector.cluster_shift(), 12);
        assert_eq!(boot_sector.cluster_size(), 4096);
        assert_eq!(boot_sector.rootdir_cluster(), 5);
    }

    #[test]
    fn parse_rejects_bad_signature() {
        let mut data = boot_sector_bytes();
        data[510] = 0;
        assert!(ExfatBootSector::parse(&data).is_err());
    }

    #[test]
    fn parse_rejects_wrong_oem_id() {
        let mut data = boot_sector_bytes();
        data[3..11].copy_from_slice(b"NTFS    ");
        assert!(ExfatBootSector::parse(&data).is_err());
    }
}
