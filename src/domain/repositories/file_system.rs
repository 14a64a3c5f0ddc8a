//! File system parser trait
//!
//! Defines the interface for walking a file system's own directory
//! metadata to find deleted entries, as distinct from raw signature
//! carving. The teacher's version spanned nine file systems; only exFAT
//! is implemented here (spec section 4.6), so the type is pared down to
//! the fields that walker actually populates rather than the general
//! superset the teacher carried for ext4/NTFS/Btrfs/XFS.

use thiserror::Error;

/// Supported file system types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileSystemType {
    ExFat,
    Raw,
}

impl FileSystemType {
    pub fn name(&self) -> &'static str {
        match self {
            FileSystemType::ExFat => "exFAT",
            FileSystemType::Raw => "Raw",
        }
    }

    pub fn supports_deleted_entries(&self) -> bool {
        matches!(self, FileSystemType::ExFat)
    }
}

/// Errors that can occur when parsing a file system.
#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("Unsupported file system: {0}")]
    Unsupported(String),

    #[error("Invalid boot sector: {0}")]
    InvalidBootSector(String),

    #[error("Corrupted directory metadata: {0}")]
    CorruptedMetadata(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("No file system detected")]
    NoFileSystem,

    #[error("File system error: {0}")]
    Other(String),
}

/// An entry for a file found in exFAT directory metadata, live or deleted.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Byte offset of the File directory entry (0x85) that anchors this
    /// record.
    pub entry_offset: u64,
    pub filename: Option<String>,
    pub size: u64,
    /// First cluster of the data run, as given by the Stream Extension
    /// entry (0xC0).
    pub first_cluster: u32,
    /// DOS-encoded creation, modification, and access timestamps (spec
    /// section 6; not converted further, since date conversion beyond
    /// decode is out of scope).
    pub created: u32,
    pub modified: u32,
    pub accessed: u32,
    /// False when bit 0x80 is clear in the File entry's `InUse` flag, i.e.
    /// a deleted-but-unwiped directory record.
    pub is_live: bool,
    /// Data blocks as resolved by the cluster-chain follower, in file
    /// order.
    pub data_blocks: Vec<u64>,
}

/// Trait for parsing file system directory metadata.
pub trait FileSystemParser: Send + Sync {
    fn detect_type(&self) -> Result<FileSystemType, FileSystemError>;

    /// Enumerates the root directory, optionally including entries marked
    /// deleted (spec section 6's `ListDeleted` option).
    fn list_entries(&self, include_deleted: bool) -> Result<Vec<DirectoryEntry>, FileSystemError>;

    /// Reads an entry's data via its resolved cluster chain.
    fn read_entry_data(&self, entry: &DirectoryEntry) -> Result<Vec<u8>, FileSystemError>;

    fn filesystem_type(&self) -> FileSystemType;

    fn is_healthy(&self) -> bool;
}
