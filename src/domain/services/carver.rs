//! Carver engine
//!
//! Drives the sliding [`RingBuffer`](super::ring_buffer::RingBuffer) across
//! a [`BlockSource`], consulting the [`FormatRegistry`] for header
//! candidates and each format's [`Detector`] to grow or close a single
//! active [`Recovery`] at a time. This replaces the teacher's two-pass
//! `ScanDeviceUseCase`/`RecoverFilesUseCase` split — which read matched
//! regions back out of a device independently of scan order — with one
//! streaming pass, since the spec's invariants (at most one active
//! recovery, output written strictly forward) cannot be expressed once
//! carving happens out of stream order.

use crate::domain::entities::{CarveResult, CarvedFile, FormatId, Recovery, RecoveryStatus};
use crate::domain::repositories::{ArtifactSink, ArtifactWriter, BlockSource, IoError, SinkError};
use crate::domain::services::detector::{DataCheckResult, Detector, HeaderResult};
use crate::domain::services::registry::FormatRegistry;
use crate::domain::services::ring_buffer::RingBuffer;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarverError {
    #[error("source I/O error: {0}")]
    Source(#[from] IoError),

    #[error("artifact sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("window_size must be a non-zero multiple of the source sector size")]
    InvalidWindowSize,
}

type ActiveRecovery = (Recovery, Box<dyn ArtifactWriter>);

/// Owns the detector registry this carver consults: one [`Detector`] per
/// [`FormatId`] it recognizes.
pub struct Carver<'a> {
    source: &'a dyn BlockSource,
    sink: &'a dyn ArtifactSink,
    registry: FormatRegistry,
    detectors: HashMap<FormatId, Box<dyn Detector>>,
}

impl<'a> Carver<'a> {
    pub fn new(
        source: &'a dyn BlockSource,
        sink: &'a dyn ArtifactSink,
        registry: FormatRegistry,
        detectors: Vec<Box<dyn Detector>>,
    ) -> Self {
        let detectors = detectors.into_iter().map(|d| (d.format(), d)).collect();
        Self {
            source,
            sink,
            registry,
            detectors,
        }
    }

    /// Runs a single forward pass over the whole source, committing every
    /// recovered file through the sink and returning a summary.
    pub fn run(&self, window_size: u32) -> Result<CarveResult, CarverError> {
        let sector_size = self.source.sector_size().max(1);
        if window_size == 0 || window_size % sector_size != 0 {
            return Err(CarverError::InvalidWindowSize);
        }

        let started = Instant::now();
        let mut result = CarveResult::new(self.source.info().path, self.source.length());

        let mut ring = RingBuffer::mount(self.source, window_size)?;
        let mut next_id: u64 = 1;
        let mut active: Option<ActiveRecovery> = None;
        let w = window_size as usize;

        loop {
            let base = ring.base();
            let window = ring.view();

            match active.as_ref().map(|(recovery, _)| recovery) {
                None => {
                    active = self.scan_for_header(window, w, base, &mut next_id, None)?;
                }
                Some(current) => {
                    // No recovery can preempt an active one (spec section
                    // 4.5's preemption rule), but candidates are still
                    // offered to their detectors so a compound document's
                    // `suppresses` list is genuinely consulted rather than
                    // relying on the preemption rule alone to hide them.
                    self.scan_for_header(window, w, base, &mut next_id, Some(current))?;
                }
            }

            if let Some((recovery, _)) = active.as_mut() {
                if !recovery.terminating {
                    let detector = self
                        .detectors
                        .get(&recovery.format)
                        .expect("recovery format always has a registered detector");

                    match detector.data_check(recovery, window, base) {
                        DataCheckResult::Continue(new_size) => {
                            recovery.calculated_size = recovery.calculated_size.max(new_size);
                            if recovery.calculated_size >= recovery.max_size {
                                recovery.clamp_to_max();
                                recovery.terminating = true;
                            }
                        }
                        DataCheckResult::Terminate(final_size) => {
                            recovery.calculated_size = recovery.calculated_size.max(final_size);
                            recovery.terminating = true;
                        }
                        DataCheckResult::Abort => {
                            self.discard(&mut active)?;
                        }
                    }
                }
            }

            if let Some((recovery, writer)) = active.as_mut() {
                let lower_half_end = base + w as u64;
                let flush_to = recovery.stream_start + recovery.calculated_size;
                let flush_to = flush_to.min(lower_half_end);
                Self::flush(recovery, writer.as_mut(), window, base, flush_to)?;

                if recovery.ready_to_close() {
                    self.finish(&mut active, window, base, &mut result)?;
                }
            }

            if ring.exhausted() {
                break;
            }
            ring.advance(self.source)?;
        }

        if active.is_some() {
            let window = ring.view();
            let base = ring.base();
            self.finish(&mut active, window, base, &mut result)?;
        }

        result.set_duration(started.elapsed());
        Ok(result)
    }

    fn scan_for_header(
        &self,
        window: &[u8],
        w: usize,
        base: u64,
        next_id: &mut u64,
        active: Option<&Recovery>,
    ) -> Result<Option<ActiveRecovery>, CarverError> {
        for cursor in 0..w {
            let candidates = self.registry.candidates_at(window, cursor);
            for sig in candidates {
                let detector = self
                    .detectors
                    .get(&sig.format())
                    .expect("registered signature always has a detector");
                match detector.header_check(window, cursor, active) {
                    HeaderResult::Start {
                        extension,
                        min_size,
                        max_size,
                        initial_calc_size,
                        state,
                        suppresses,
                    } => {
                        if active.is_some() {
                            // Preemption rule (spec section 4.5): a match
                            // found while another recovery is live never
                            // starts a new one.
                            continue;
                        }
                        let id = *next_id;
                        *next_id += 1;
                        let mut recovery = Recovery::new(
                            id,
                            sig.format(),
                            extension,
                            base + cursor as u64,
                            initial_calc_size,
                            min_size,
                            max_size,
                            state,
                        );
                        recovery.suppresses = suppresses;
                        let writer = self.sink.open(id, extension)?;
                        return Ok(Some((recovery, writer)));
                    }
                    HeaderResult::SuppressActive => {
                        log::debug!(
                            "format {:?} suppressed by active recovery at offset {}",
                            sig.format(),
                            base + cursor as u64
                        );
                        continue;
                    }
                    HeaderResult::NoMatch => continue,
                }
            }
        }
        Ok(None)
    }

    /// Writes bytes `[written_size, flush_to_abs)` of the active recovery
    /// that are currently present in `window`, bounding memory use to the
    /// ring buffer's own `2W` (spec section 4.4).
    fn flush(
        recovery: &mut Recovery,
        writer: &mut dyn ArtifactWriter,
        window: &[u8],
        base: u64,
        flush_to_abs: u64,
    ) -> Result<(), CarverError> {
        let written_abs = recovery.stream_start + recovery.written_size;
        if flush_to_abs <= written_abs {
            return Ok(());
        }
        let start_in_window = written_abs.saturating_sub(base) as usize;
        if start_in_window >= window.len() {
            return Ok(());
        }
        let end_in_window = ((flush_to_abs.saturating_sub(base)) as usize).min(window.len());
        if end_in_window <= start_in_window {
            return Ok(());
        }
        writer.write(&window[start_in_window..end_in_window])?;
        recovery.written_size += (end_in_window - start_in_window) as u64;
        Ok(())
    }

    fn finish(
        &self,
        active: &mut Option<ActiveRecovery>,
        window: &[u8],
        base: u64,
        result: &mut CarveResult,
    ) -> Result<(), CarverError> {
        let Some((mut recovery, mut writer)) = active.take() else {
            return Ok(());
        };

        let flush_to = recovery.stream_start + recovery.calculated_size;
        Self::flush(&mut recovery, writer.as_mut(), window, base, flush_to)?;

        let detector = self
            .detectors
            .get(&recovery.format)
            .expect("recovery format always has a registered detector");
        let tail_start = recovery.stream_start.saturating_sub(base).min(window.len() as u64) as usize;
        if let Some(corrected) = detector.file_check(&recovery, &window[tail_start..]) {
            recovery.calculated_size = corrected;
            recovery.clamp_to_max();

            // file_check may grow the file (PSB's trailing raw image data)
            // or shrink it (a footer search landing short of what was
            // already flushed); the artifact on disk must track whichever
            // direction the correction moved it before it is committed.
            if recovery.calculated_size > recovery.written_size {
                let flush_to = recovery.stream_start + recovery.calculated_size;
                Self::flush(&mut recovery, writer.as_mut(), window, base, flush_to)?;
            } else if recovery.calculated_size < recovery.written_size {
                writer.truncate(recovery.calculated_size)?;
                recovery.written_size = recovery.calculated_size;
            }
        }

        if recovery.meets_min_size() {
            recovery.status = RecoveryStatus::Committed;
            let path = writer.close(None, None)?;
            let carved = CarvedFile::new(
                recovery.artifact_id,
                recovery.format,
                recovery.stream_start,
                recovery.written_size,
                path,
            );
            result.add_committed(carved.format(), carved.size());
            result.add_carved(carved);
        } else {
            recovery.status = RecoveryStatus::Discarded;
            writer.discard()?;
        }
        Ok(())
    }

    fn discard(&self, active: &mut Option<ActiveRecovery>) -> Result<(), CarverError> {
        if let Some((mut recovery, writer)) = active.take() {
            recovery.status = RecoveryStatus::Discarded;
            writer.discard()?;
        }
        Ok(())
    }
}
