//! Recovery entity
//!
//! A `Recovery` is the mutable record of one in-progress carve. The teacher's
//! `RecoveredFile` only ever represented a finished carve produced in one
//! shot from a fully-buffered slice; this entity generalizes it into
//! something meaningful while still streaming, per spec section 3.

use super::signature::FormatId;

/// Lifecycle state of a [`Recovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    Active,
    Committed,
    Discarded,
}

/// PSB section state machine, attached per-recovery rather than as module
/// level mutable state (spec section 9's "global mutable state" note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsbSection {
    ColorMode,
    ImageResources,
    LayerInfo,
    ImageData,
}

/// Per-format scratch state a detector needs to carry across successive
/// `data_check` calls (spec section 9: tagged variants dispatched by the
/// format's own detector, attached to the `Recovery` rather than stored as
/// a callback pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// `in_sub_block`: whether the cursor currently sits inside a GIF
    /// extension/image sub-block chain rather than at a block introducer.
    Gif { in_sub_block: bool },
    /// `end_marker` distinguishes PNG's `IEND` from MNG's `MEND` (JNG also
    /// terminates on `IEND`).
    Chunked { end_marker: [u8; 4] },
    Mpeg,
    /// Size is known up front; nothing to track.
    Icc,
    Psb {
        section: PsbSection,
        image_data_size_max: u64,
    },
}

/// An in-progress (or just-closed) carve.
#[derive(Debug, Clone)]
pub struct Recovery {
    pub artifact_id: u64,
    pub format: FormatId,
    pub extension: &'static str,
    pub stream_start: u64,
    /// Bytes of structure validated so far; doubles as the detector's parse
    /// cursor (`stream_start + calculated_size` is the next unexamined
    /// absolute offset). Monotonically non-decreasing until `file_check`
    /// (spec invariant).
    pub calculated_size: u64,
    /// Bytes actually flushed to the artifact sink so far.
    pub written_size: u64,
    pub min_size: u64,
    pub max_size: u64,
    pub state: DetectorState,
    pub status: RecoveryStatus,
    /// Set once `data_check` has returned `Terminate` or the size bound
    /// was hit: `calculated_size` is now final, and the carver's only
    /// remaining job is to flush any bytes not yet written (they may
    /// still span windows ahead) before closing.
    pub terminating: bool,
    /// Set when a compound-document detector (PSB today) wants header
    /// matches for an embedded format suppressed while this recovery is
    /// active (spec section 3's preemption-override rule).
    pub suppresses: Option<FormatId>,
}

impl Recovery {
    pub fn new(
        artifact_id: u64,
        format: FormatId,
        extension: &'static str,
        stream_start: u64,
        initial_calc_size: u64,
        min_size: u64,
        max_size: u64,
        state: DetectorState,
    ) -> Self {
        Self {
            artifact_id,
            format,
            extension,
            stream_start,
            calculated_size: initial_calc_size,
            written_size: 0,
            min_size,
            max_size,
            state,
            status: RecoveryStatus::Active,
            terminating: false,
            suppresses: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RecoveryStatus::Active
    }

    pub fn ready_to_close(&self) -> bool {
        self.terminating && self.written_size >= self.calculated_size
    }

    /// Next absolute stream offset this recovery has not yet examined.
    pub fn parse_cursor(&self) -> u64 {
        self.stream_start + self.calculated_size
    }

    /// Clamps `calculated_size` to `max_size`, per `SizeExceeded` handling.
    pub fn clamp_to_max(&mut self) {
        if self.calculated_size > self.max_size {
            self.calculated_size = self.max_size;
        }
    }

    pub fn meets_min_size(&self) -> bool {
        self.written_size >= self.min_size
    }
}
