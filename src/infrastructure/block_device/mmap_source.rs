//! Memory-mapped block source implementation
//!
//! Zero-copy alternative to [`FileBlockSource`](super::file_source::FileBlockSource),
//! useful when the source fits comfortably in the address space and
//! repeated seeking would otherwise dominate.

use crate::domain::repositories::{BlockSource, IoError, SourceInfo};
use memmap2::Mmap;
use std::fs::OpenOptions;
use std::path::Path;

pub struct MmapBlockSource {
    mmap: Mmap,
    path: String,
    length: u64,
    sector_size: u32,
}

impl MmapBlockSource {
    fn detect_sector_size(path: &Path) -> u32 {
        if path.starts_with("/dev/") {
            4096
        } else {
            512
        }
    }

    /// Zero-copy slice of the whole mapped source.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    #[inline]
    pub fn slice_at(&self, offset: u64, length: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(length)?;
        if end <= self.mmap.len() {
            Some(&self.mmap[start..end])
        } else {
            None
        }
    }
}

impl BlockSource for MmapBlockSource {
    fn open(path: &str) -> Result<Self, IoError> {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            return Err(IoError::NotFound(path.to_string()));
        }

        let file = OpenOptions::new().read(true).open(path_obj).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                IoError::PermissionDenied(format!("{} - try running with elevated privileges", path))
            } else {
                IoError::Io(e)
            }
        })?;

        let metadata = file.metadata()?;
        let length = metadata.len();
        if length == 0 {
            return Err(IoError::Other(format!("source {} has zero length", path)));
        }

        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| IoError::Other(format!("failed to memory-map source: {}", e)))?;
        let sector_size = Self::detect_sector_size(path_obj);

        Ok(Self {
            mmap,
            path: path.to_string(),
            length,
            sector_size,
        })
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            path: self.path.clone(),
            length: self.length,
            sector_size: self.sector_size,
        }
    }

    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, IoError> {
        if offset >= self.length {
            return Err(IoError::InvalidOffset {
                offset,
                length: self.length,
            });
        }

        let available = (self.length - offset) as usize;
        let to_read = buf.len().min(available);
        let start = offset as usize;
        buf[..to_read].copy_from_slice(&self.mmap[start..start + to_read]);
        Ok(to_read)
    }
}

unsafe impl Send for MmapBlockSource {}
unsafe impl Sync for MmapBlockSource {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn open_nonexistent_fails() {
        let result = MmapBlockSource::open("/nonexistent/file");
        assert!(result.is_err());
    }

    #[test]
    fn read_returns_requested_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, memory-mapped world!").unwrap();
        file.flush().unwrap();

        let source = MmapBlockSource::open(file.path().to_str().unwrap()).unwrap();
        let mut buf = [0u8; 5];
        let n = source.read(0, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"Hello");
    }

    #[test]
    fn slice_at_is_zero_copy() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Zero-copy access!").unwrap();
        file.flush().unwrap();

        let source = MmapBlockSource::open(file.path().to_str().unwrap()).unwrap();
        let slice = source.slice_at(5, 4).unwrap();
        assert_eq!(slice, b"copy");
    }

    #[test]
    fn read_short_at_end_of_stream() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![7u8; 10]).unwrap();
        file.flush().unwrap();

        let source = MmapBlockSource::open(file.path().to_str().unwrap()).unwrap();
        let mut buf = [0u8; 16];
        let n = source.read(4, &mut buf).unwrap();
        assert_eq!(n, 6);
    }
}
