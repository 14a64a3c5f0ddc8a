//! Detector contract
//!
//! Generalizes the teacher's `FileCarver` (which carved a whole buffer in
//! one shot) into a three-phase streaming contract a `Carver` drives one
//! ring-buffer window at a time (spec section 4.3).

use crate::domain::entities::{DetectorState, FormatId, Recovery};

/// Outcome of checking whether a signature match at the cursor actually
/// begins a new recoverable file.
#[derive(Debug, Clone)]
pub enum HeaderResult {
    /// The candidate bytes do not begin a file this detector recognizes.
    NoMatch,
    /// A new `Recovery` should be opened here.
    Start {
        extension: &'static str,
        min_size: u64,
        max_size: u64,
        initial_calc_size: u64,
        state: DetectorState,
        /// Format whose header matches should be ignored while this
        /// recovery stays active (the PSB/compound-document suppression
        /// rule).
        suppresses: Option<FormatId>,
    },
    /// A different, already-active recovery has suppressed this format at
    /// the current cursor; the carver should not preempt it.
    SuppressActive,
}

/// Outcome of extending an active recovery by one more window.
#[derive(Debug, Clone, Copy)]
pub enum DataCheckResult {
    /// Keep going; `calculated_size` is updated to the given value.
    Continue(u64),
    /// The file's true end was found; finalize at this size.
    Terminate(u64),
    /// The structure is corrupt beyond repair; discard the recovery.
    Abort,
}

/// Per-format recognizer. One `Detector` is registered per `FormatId`
/// and is consulted by the `Carver` at every signature match and, while a
/// recovery of its format is active, at every window advance.
pub trait Detector: Send + Sync {
    fn format(&self) -> FormatId;

    /// Examines the window at `cursor` (an index into `window`, not an
    /// absolute stream offset) to decide whether a file begins here.
    /// `active` is the currently live recovery, if any — a detector
    /// consults it to decide whether its own format should be suppressed
    /// while a compound-document recovery of another format owns the
    /// stream (the PSB/embedded-PNG case).
    fn header_check(&self, window: &[u8], cursor: usize, active: Option<&Recovery>) -> HeaderResult;

    /// Extends an in-progress recovery by examining bytes from
    /// `recovery.parse_cursor()` onward in `window`, where `window_base`
    /// is the absolute offset of `window[0]`.
    fn data_check(&self, recovery: &mut Recovery, window: &[u8], window_base: u64) -> DataCheckResult;

    /// Final fixup once `calculated_size` is fixed and `written_size`
    /// bytes have reached the artifact sink. Returns a corrected size, or
    /// `None` to keep the size as calculated.
    fn file_check(&self, recovery: &Recovery, tail: &[u8]) -> Option<u64> {
        let _ = (recovery, tail);
        None
    }
}
