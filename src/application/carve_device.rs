//! Carve device use case
//!
//! Merges the teacher's `ScanDeviceUseCase` and `RecoverFilesUseCase` into
//! one streaming pass: the `Carver` scans and carves at once, so there is
//! no intermediate `ScanResult` to hand between two use cases the way the
//! teacher's two-phase design required.

use crate::application::dto::CarveOptions;
use crate::domain::entities::{CarveResult, FormatId, Signature};
use crate::domain::repositories::{ArtifactSink, BlockSource};
use crate::domain::services::{Carver, CarverError, Detector, FormatRegistry};
use std::collections::HashMap;

/// Carves every recoverable file out of a `BlockSource` into an
/// `ArtifactSink`.
pub struct CarveDeviceUseCase {
    registry: FormatRegistry,
    detectors: Vec<Box<dyn Detector>>,
}

impl CarveDeviceUseCase {
    /// Builds a use case from a caller-supplied registry and detector set.
    /// Composition root wiring (which detectors exist at all) belongs to
    /// the infrastructure layer's `default_registry`/`default_detectors`,
    /// not here.
    pub fn new(registry: FormatRegistry, detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { registry, detectors }
    }

    /// Runs the carve, narrowing the registry to `options.formats` first if
    /// the caller asked for specific formats (spec section 6's `--with
    /// <ext,…>`). Consumes `self`: a `Carver` takes its detector set by
    /// value, and a CLI invocation only ever carves once.
    pub fn execute(
        self,
        source: &dyn BlockSource,
        sink: &dyn ArtifactSink,
        options: &CarveOptions,
    ) -> Result<CarveResult, CarverError> {
        log::info!(
            "starting carve of {} ({} bytes), window_size={}",
            options.source_path,
            source.length(),
            options.window_size
        );

        let registry = narrow_registry(&self.registry, &options.formats);
        let carver = Carver::new(source, sink, registry, self.detectors);
        let result = carver.run(options.window_size)?;

        log::info!(
            "carve complete: committed {} files ({} bytes) in {:.2}s",
            result.committed_count(),
            result.committed_bytes(),
            result.duration().as_secs_f64()
        );

        Ok(result)
    }
}

/// Returns a registry restricted to `formats`, or an equivalent copy of
/// `source` when `formats` is empty. Detectors for excluded formats are
/// left in the carver's detector map unused — harmless, since
/// `scan_for_header` only ever offers candidates the narrowed registry
/// still contains.
fn narrow_registry(source: &FormatRegistry, formats: &[FormatId]) -> FormatRegistry {
    let wanted: Option<HashMap<FormatId, ()>> =
        (!formats.is_empty()).then(|| formats.iter().map(|&f| (f, ())).collect());

    let mut registry = FormatRegistry::new();
    for sig in source.all_signatures() {
        if wanted.as_ref().is_none_or(|w| w.contains_key(&sig.format())) {
            let _ = registry.register(Signature::new(sig.format(), sig.offset_in_window(), sig.bytes().to_vec()));
        }
    }
    registry
}
