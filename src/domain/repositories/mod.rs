//! Repository traits (interfaces)
//!
//! These traits define the contracts for external dependencies.
//! They follow the Dependency Inversion Principle (DIP) from SOLID.

mod artifact_sink;
mod block_source;
mod file_system;

pub use artifact_sink::{ArtifactSink, ArtifactWriter, SinkError};
pub use block_source::{BlockSource, IoError, SourceInfo};
pub use file_system::{DirectoryEntry, FileSystemError, FileSystemParser, FileSystemType};
