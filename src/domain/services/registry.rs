//! Format registry service
//!
//! Adapted from the teacher's `SignatureRegistry`. That registry grouped
//! signatures by `FileType` and matched only at offset zero; this one
//! additionally indexes signatures by first byte and honors each
//! signature's own in-window offset (spec section 4.2), since ICC and PSB
//! anchor their magic bytes well past the start of the window.

use crate::domain::entities::{FormatId, Signature};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("signature for {format} at offset {offset} is already registered")]
    Duplicate { format: FormatId, offset: u16 },
}

/// Deterministic, registration-ordered store of `(offset, bytes)`
/// signatures, indexed by `(offset, first byte)` for fast rejection at
/// each cursor position.
#[derive(Debug, Default)]
pub struct FormatRegistry {
    signatures: Vec<Signature>,
    index: HashMap<(u16, u8), Vec<usize>>,
    /// Distinct offsets in registration order, so `candidates_at` only
    /// probes the window once per offset that is actually in use.
    offsets: Vec<u16>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
            index: HashMap::new(),
            offsets: Vec::new(),
        }
    }

    /// Registers a signature, rejecting an exact `(offset, bytes)` repeat
    /// regardless of which format names it (spec section 4.2).
    pub fn register(&mut self, signature: Signature) -> Result<(), RegistryError> {
        for existing in &self.signatures {
            if existing.offset_in_window() == signature.offset_in_window()
                && existing.bytes() == signature.bytes()
            {
                return Err(RegistryError::Duplicate {
                    format: signature.format(),
                    offset: signature.offset_in_window(),
                });
            }
        }

        let offset = signature.offset_in_window();
        let first_byte = signature.bytes()[0];
        if !self.offsets.contains(&offset) {
            self.offsets.push(offset);
        }

        let index = self.signatures.len();
        self.index.entry((offset, first_byte)).or_default().push(index);
        self.signatures.push(signature);
        Ok(())
    }

    /// Returns every signature that matches `window` at `cursor`, in
    /// registration order, for the carver to offer to each format's
    /// `Detector` in turn.
    pub fn candidates_at(&self, window: &[u8], cursor: usize) -> Vec<&Signature> {
        let mut out = Vec::new();
        for &offset in &self.offsets {
            let Some(pos) = cursor.checked_add(offset as usize) else {
                continue;
            };
            let Some(&byte) = window.get(pos) else {
                continue;
            };
            if let Some(indices) = self.index.get(&(offset, byte)) {
                for &i in indices {
                    let sig = &self.signatures[i];
                    if sig.matches_at(window, cursor) {
                        out.push(sig);
                    }
                }
            }
        }
        out
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn all_signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }
}
