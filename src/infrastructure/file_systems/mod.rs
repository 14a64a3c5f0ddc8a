//! File system parsers
//!
//! The teacher's version spanned nine file systems; only exFAT's own
//! directory metadata is parsed here (spec section 4.6) — raw signature
//! carving covers everything else.

pub mod exfat;

pub use exfat::ExfatWalker;
