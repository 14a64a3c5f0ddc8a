//! Artifact sink trait
//!
//! Defines the interface the carver streams committed bytes through. Unlike
//! the teacher's `RecoveredFileWriter`, which accepted one fully-buffered
//! `RecoveredFile` at a time, a sink here is opened once per `Recovery` and
//! fed incrementally as the scan cursor advances, since a `Recovery`'s
//! bytes are never held in memory all at once (spec section 6).

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing an artifact.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Output directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Disk full: {0}")]
    DiskFull(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink error: {0}")]
    Other(String),
}

/// A single artifact's write handle, open for the lifetime of one
/// `Recovery`.
///
/// `write` is called once per flushed chunk as the ring buffer's lower
/// half retires; bytes must land in the order they are written, since the
/// carver never seeks backward in its own output (spec invariant).
pub trait ArtifactWriter: Send {
    fn write(&mut self, buf: &[u8]) -> Result<(), SinkError>;

    /// Truncates the artifact to `size` bytes, used when `file_check`
    /// shrinks `calculated_size` below what was already flushed.
    fn truncate(&mut self, size: u64) -> Result<(), SinkError>;

    /// Finalizes the artifact, applying the source's atime/mtime if known,
    /// and returns its final path.
    fn close(self: Box<Self>, atime: Option<u64>, mtime: Option<u64>) -> Result<PathBuf, SinkError>;

    /// Abandons the artifact, removing any bytes already written. Used when
    /// a `Recovery` is discarded rather than committed.
    fn discard(self: Box<Self>) -> Result<(), SinkError>;
}

/// Factory for artifact writers, one per committed carve (spec section 6:
/// "Artifacts are written as-is... with names `<counter>.<ext>`").
pub trait ArtifactSink: Send + Sync {
    fn new(output_dir: &Path) -> Result<Self, SinkError>
    where
        Self: Sized;

    /// Opens a new artifact named `<counter>.<ext>` under the output
    /// directory.
    fn open(&self, counter: u64, ext: &str) -> Result<Box<dyn ArtifactWriter>, SinkError>;

    fn output_dir(&self) -> &Path;

    fn files_written(&self) -> usize;

    fn bytes_written(&self) -> u64;
}
