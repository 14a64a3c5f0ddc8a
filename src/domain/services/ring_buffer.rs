//! Ring buffer service
//!
//! Holds a sliding `2W`-byte window over the source stream so a `Detector`
//! can look ahead up to `W` bytes from the scan cursor without the carver
//! ever materializing the whole source in memory (spec section 4.1). This
//! plays the role the teacher's `AlignedBuffer` plays for disk-aligned
//! reads, but trades the unsafe raw-pointer allocator for a plain `Vec<u8>`
//! since nothing here requires page alignment.

use crate::domain::repositories::{BlockSource, IoError};

/// A `2W`-byte sliding window, `base` bytes into the source stream.
///
/// Bytes `[0, W)` are the "lower half" already offered to the scan cursor;
/// `[W, 2W)` are the "upper half" look-ahead bytes a detector may still
/// consult. `advance` retires the lower half, copies the upper half down,
/// and refills the new upper half, giving the classic half-window overlap
/// a `Detector` needs to see a signature or terminator straddling an
/// earlier boundary.
pub struct RingBuffer {
    data: Vec<u8>,
    window_size: u32,
    base: u64,
    /// Bytes at or after this offset into `data` are past end-of-stream and
    /// zero-filled; `None` once the whole source has been consumed.
    valid_len: usize,
    source_len: u64,
}

impl RingBuffer {
    /// Mounts a fresh buffer over `source`, reading the first `2W` bytes
    /// (or fewer, if the source is shorter).
    pub fn mount(source: &dyn BlockSource, window_size: u32) -> Result<Self, IoError> {
        debug_assert!(window_size > 0, "window_size must be non-zero");
        let mut data = vec![0u8; window_size as usize * 2];
        let source_len = source.length();
        let to_read = data.len().min(source_len as usize);
        let valid_len = source.read(0, &mut data[..to_read])?;
        Ok(Self {
            data,
            window_size,
            base: 0,
            valid_len,
            source_len,
        })
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Absolute stream offset of `data[0]`.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The full `2W`-byte window, zero-padded past end-of-stream.
    pub fn view(&self) -> &[u8] {
        &self.data
    }

    /// True once the lower half's absolute range has reached the end of
    /// the source and there is nothing further to scan.
    pub fn exhausted(&self) -> bool {
        self.base >= self.source_len
    }

    /// Shifts the upper half down into the lower half and refills the new
    /// upper half from `source`, advancing `base` by `window_size`.
    pub fn advance(&mut self, source: &dyn BlockSource) -> Result<(), IoError> {
        let w = self.window_size as usize;
        self.data.copy_within(w.., 0);
        self.base += w as u64;

        let fill_start = self.base + w as u64;
        let buf = &mut self.data[w..];
        if fill_start >= self.source_len {
            buf.fill(0);
            self.valid_len = self.valid_len.saturating_sub(w).max(0);
        } else {
            let remaining = (self.source_len - fill_start) as usize;
            let to_read = buf.len().min(remaining);
            let read = source.read(fill_start, &mut buf[..to_read])?;
            if read < buf.len() {
                buf[read..].fill(0);
            }
            self.valid_len = w + read;
        }
        Ok(())
    }

    /// Bytes of the current window that reflect real source data rather
    /// than end-of-stream zero padding.
    pub fn valid_len(&self) -> usize {
        self.valid_len
    }
}
