//! Domain entities
//!
//! Core business objects that represent the fundamental concepts in the
//! file carving domain.

mod recovered_file;
mod recovery;
mod scan_result;
mod signature;

pub use recovered_file::CarvedFile;
pub use recovery::{DetectorState, PsbSection, Recovery, RecoveryStatus};
pub use scan_result::{CarveProgress, CarveResult};
pub use signature::{FormatId, Signature};
