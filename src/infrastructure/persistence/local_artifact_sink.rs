//! Local artifact sink implementation
//!
//! Adapted from the teacher's `LocalFileWriter`. That writer accepted one
//! fully-buffered `RecoveredFile` and optionally converted it to PNG; this
//! one opens an append-only handle per `Recovery` and is fed incrementally
//! as the carver's scan cursor advances, with no format conversion (spec
//! section 6: "artifacts are written as-is").

use crate::domain::repositories::{ArtifactSink, ArtifactWriter, SinkError};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Local file system artifact sink.
pub struct LocalArtifactSink {
    output_dir: PathBuf,
    files_written: Arc<AtomicUsize>,
    bytes_written: Arc<AtomicU64>,
}

impl LocalArtifactSink {
    fn output_path(&self, counter: u64, ext: &str) -> PathBuf {
        let mut path = self.output_dir.clone();
        path.push(format!("{:06}.{}", counter, ext));
        path
    }
}

impl ArtifactSink for LocalArtifactSink {
    fn new(output_dir: &Path) -> Result<Self, SinkError> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    SinkError::PermissionDenied(output_dir.display().to_string())
                } else {
                    SinkError::Io(e)
                }
            })?;
        }

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            files_written: Arc::new(AtomicUsize::new(0)),
            bytes_written: Arc::new(AtomicU64::new(0)),
        })
    }

    fn open(&self, counter: u64, ext: &str) -> Result<Box<dyn ArtifactWriter>, SinkError> {
        let path = self.output_path(counter, ext);
        let file = File::create(&path)?;
        Ok(Box::new(LocalArtifactWriter {
            file,
            path,
            files_written: self.files_written.clone(),
            bytes_written: self.bytes_written.clone(),
        }))
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn files_written(&self) -> usize {
        self.files_written.load(Ordering::Relaxed)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

struct LocalArtifactWriter {
    file: File,
    path: PathBuf,
    files_written: Arc<AtomicUsize>,
    bytes_written: Arc<AtomicU64>,
}

impl ArtifactWriter for LocalArtifactWriter {
    fn write(&mut self, buf: &[u8]) -> Result<(), SinkError> {
        self.file.write_all(buf)?;
        self.bytes_written.fetch_add(buf.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> Result<(), SinkError> {
        self.file.set_len(size)?;
        Ok(())
    }

    fn close(mut self: Box<Self>, atime: Option<u64>, mtime: Option<u64>) -> Result<PathBuf, SinkError> {
        self.file.sync_all()?;
        drop(self.file);

        if let (Some(atime), Some(mtime)) = (atime, mtime) {
            let atime = FileTime::from_unix_time(atime as i64, 0);
            let mtime = FileTime::from_unix_time(mtime as i64, 0);
            filetime::set_file_times(&self.path, atime, mtime)
                .map_err(|e| SinkError::Other(format!("failed to set artifact timestamps: {}", e)))?;
        }

        self.files_written.fetch_add(1, Ordering::Relaxed);
        Ok(self.path)
    }

    fn discard(self: Box<Self>) -> Result<(), SinkError> {
        drop(self.file);
        fs::remove_file(&self.path).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(SinkError::Io(e))
            }
        })
    }
}
