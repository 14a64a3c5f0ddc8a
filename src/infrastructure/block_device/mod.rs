//! Block source implementations

mod file_source;
mod mmap_source;

pub use file_source::FileBlockSource;
pub use mmap_source::MmapBlockSource;
