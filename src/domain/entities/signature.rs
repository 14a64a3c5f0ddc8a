//! Signature entity
//!
//! A signature is a byte pattern anchored at a fixed in-window offset that
//! advises the [`FormatRegistry`](crate::domain::services::FormatRegistry)
//! to invoke a specific [`Detector`](crate::domain::services::Detector).
//! Unlike the whole-header-at-offset-0 matching the teacher's
//! `FileSignature` did, a `Signature` here records its own offset because
//! formats like ICC anchor their magic bytes well past the start of the
//! window (`acsp` at offset 36).

use std::fmt;

/// The formats this carver ships detectors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatId {
    Gif,
    Png,
    Mng,
    Jng,
    Mpeg,
    Icc,
    Psb,
}

impl FormatId {
    /// Default file extension used when naming committed artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatId::Gif => "gif",
            FormatId::Png => "png",
            FormatId::Mng => "mng",
            FormatId::Jng => "jng",
            FormatId::Mpeg => "mpg",
            FormatId::Icc => "icc",
            FormatId::Psb => "psb",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatId::Gif => "GIF Image",
            FormatId::Png => "PNG Image",
            FormatId::Mng => "MNG Animation",
            FormatId::Jng => "JNG Image",
            FormatId::Mpeg => "MPEG Video",
            FormatId::Icc => "ICC Color Profile",
            FormatId::Psb => "Photoshop Big Document",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A registered byte pattern anchored at a fixed in-window offset.
///
/// Uniquely identified by its `(offset_in_window, bytes)` pair across the
/// whole registry; `FormatRegistry::register` rejects duplicates (spec:
/// "duplicates are a configuration error").
#[derive(Debug, Clone)]
pub struct Signature {
    format: FormatId,
    offset_in_window: u16,
    bytes: Vec<u8>,
}

impl Signature {
    pub fn new(format: FormatId, offset_in_window: u16, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            offset_in_window,
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> FormatId {
        self.format
    }

    pub fn offset_in_window(&self) -> u16 {
        self.offset_in_window
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Checks whether `window` matches this signature byte-exact at
    /// `cursor + offset_in_window`.
    pub fn matches_at(&self, window: &[u8], cursor: usize) -> bool {
        let start = cursor + self.offset_in_window as usize;
        let end = match start.checked_add(self.bytes.len()) {
            Some(e) => e,
            None => return false,
        };
        end <= window.len() && &window[start..end] == self.bytes.as_slice()
    }
}
