//! exFAT file system walker
//!
//! Reads an exFAT volume's own directory metadata to enumerate (and, for
//! deleted entries, heuristically recover) files without relying on
//! signature matching.

mod boot_sector;
mod walker;

pub use walker::ExfatWalker;
