//! Representative format detectors
//!
//! Five detectors ship as the concrete representatives the spec calls out
//! (GIF, PNG/MNG/JNG, MPEG, ICC, PSB); each is grounded in a teacher method
//! that did the same job for a single fully-buffered slice, reworked to
//! run one ring-buffer window at a time.

mod gif;
mod icc;
mod mpeg;
mod png;
mod psb;

pub use gif::GifDetector;
pub use icc::IccDetector;
pub use mpeg::{MpegDetector, START_CODES as MPEG_START_CODES};
pub use png::ChunkedDetector;
pub use psb::PsbDetector;

use crate::domain::entities::{FormatId, Signature};
use crate::domain::services::{Detector, FormatRegistry, RegistryError};

/// Builds the default registry and detector set the CLI wires up: every
/// signature the five representative detectors recognize, registered in a
/// fixed, deterministic order.
pub fn default_registry() -> Result<FormatRegistry, RegistryError> {
    let mut registry = FormatRegistry::new();

    registry.register(Signature::new(FormatId::Gif, 0, *b"GIF89a"))?;
    registry.register(Signature::new(FormatId::Gif, 0, *b"GIF87a"))?;

    registry.register(Signature::new(FormatId::Png, 0, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]))?;
    registry.register(Signature::new(FormatId::Mng, 0, [0x8A, b'M', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]))?;
    registry.register(Signature::new(FormatId::Jng, 0, [0x8B, b'J', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]))?;

    for code in MPEG_START_CODES {
        registry.register(Signature::new(FormatId::Mpeg, 0, code))?;
    }

    registry.register(Signature::new(FormatId::Icc, 36, *b"acsp"))?;

    registry.register(Signature::new(FormatId::Psb, 0, [0x8B, b'P', b'S', 0x00, 0x02]))?;

    Ok(registry)
}

/// Builds the detector instance for every format `default_registry`
/// anchors signatures on.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(GifDetector),
        Box::new(ChunkedDetector::png()),
        Box::new(ChunkedDetector::mng()),
        Box::new(ChunkedDetector::jng()),
        Box::new(MpegDetector),
        Box::new(IccDetector),
        Box::new(PsbDetector),
    ]
}
