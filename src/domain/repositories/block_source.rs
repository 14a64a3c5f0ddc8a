//! Block source trait
//!
//! Defines the interface for reading raw bytes from a storage medium. This
//! is the sole collaborator the carver treats as external (spec section 1):
//! partition tables, disk geometry, and device discovery are out of scope
//! here, just the read/size/sector-size contract in spec section 6.

use std::io;
use thiserror::Error;

/// Errors surfaced by a [`BlockSource`].
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid offset: {offset} exceeds source length {length}")]
    InvalidOffset { offset: u64, length: u64 },

    #[error("Source error: {0}")]
    Other(String),
}

/// Descriptive information about an opened source, used by the CLI's
/// `info` subcommand.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub path: String,
    pub length: u64,
    pub sector_size: u32,
}

impl SourceInfo {
    pub fn sector_count(&self) -> u64 {
        self.length / self.sector_size as u64
    }
}

/// A random-access, read-only byte stream with a sector size and total
/// length (spec section 3).
///
/// Read errors are surfaced; short reads are only meaningful at
/// end-of-stream — it is the `RingBuffer`'s job, not the source's, to
/// zero-pad past EOF (spec section 4.1).
pub trait BlockSource: Send + Sync {
    fn open(path: &str) -> Result<Self, IoError>
    where
        Self: Sized;

    fn info(&self) -> SourceInfo;

    fn sector_size(&self) -> u32;

    fn length(&self) -> u64;

    /// Reads into `buf` starting at `offset`, returning the number of bytes
    /// actually read. A short read is only valid when `offset + buf.len()`
    /// would run past `length()`.
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, IoError>;
}
