//! Carved file entity
//!
//! Represents a file that has been committed by the carver: a closed
//! [`Recovery`](super::recovery::Recovery) whose `written_size` met the
//! detector's `min_size`. Unlike the teacher's `RecoveredFile`, this does
//! not hold the file's bytes in memory — the carver streams bytes to the
//! artifact sink as the scan cursor advances (spec: "bounded memory is
//! O(2W + sizeof(Recovery)) independent of image size"), so by the time a
//! `CarvedFile` exists the data is already on disk.

use super::signature::FormatId;
use std::path::PathBuf;

/// A successfully committed carve.
#[derive(Debug, Clone)]
pub struct CarvedFile {
    id: u64,
    format: FormatId,
    source_offset: u64,
    size: u64,
    saved_path: PathBuf,
}

impl CarvedFile {
    pub fn new(id: u64, format: FormatId, source_offset: u64, size: u64, saved_path: PathBuf) -> Self {
        Self {
            id,
            format,
            source_offset,
            size,
            saved_path,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn format(&self) -> FormatId {
        self.format
    }

    pub fn source_offset(&self) -> u64 {
        self.source_offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn saved_path(&self) -> &PathBuf {
        &self.saved_path
    }

    /// Generates the conventional `<counter>.<ext>` artifact name (spec
    /// section 6: "Artifacts are written as-is... with names
    /// `<counter>.<ext>`").
    pub fn suggested_filename(&self) -> String {
        format!("{:06}.{}", self.id, self.format.extension())
    }

    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size >= GB {
            format!("{:.2} GB", self.size as f64 / GB as f64)
        } else if self.size >= MB {
            format!("{:.2} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.2} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size)
        }
    }
}
