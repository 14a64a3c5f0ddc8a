//! ICC color profile detector
//!
//! Grounded in the teacher's `ImageCarver::read_bmp_size`/`read_riff_size`,
//! which both read a fixed-offset size field via
//! `byteorder::{BigEndian/LittleEndian}`; ICC profiles carry their total
//! size at offset 0 in the same style, so the whole file size is known the
//! instant the header matches (spec section 4.3).

use crate::domain::entities::{DetectorState, FormatId, Recovery};
use crate::domain::services::{DataCheckResult, Detector, HeaderResult};
use byteorder::{BigEndian, ByteOrder};

const ACSP_OFFSET: usize = 36;
const ACSP_LEN: usize = 4;

pub struct IccDetector;

impl Detector for IccDetector {
    fn format(&self) -> FormatId {
        FormatId::Icc
    }

    fn header_check(&self, window: &[u8], cursor: usize, _active: Option<&Recovery>) -> HeaderResult {
        if cursor + ACSP_OFFSET + ACSP_LEN > window.len() || cursor + 12 > window.len() {
            return HeaderResult::NoMatch;
        }
        let size = BigEndian::read_u32(&window[cursor..cursor + 4]) as u64;
        if size <= 128 {
            return HeaderResult::NoMatch;
        }
        if window[cursor + 10] != 0 || window[cursor + 11] != 0 {
            return HeaderResult::NoMatch;
        }

        HeaderResult::Start {
            extension: "icc",
            min_size: 128,
            max_size: size,
            initial_calc_size: size,
            state: DetectorState::Icc,
            suppresses: None,
        }
    }

    fn data_check(&self, recovery: &mut Recovery, _window: &[u8], _window_base: u64) -> DataCheckResult {
        // The total size was already read from the header; there is
        // nothing further to parse.
        DataCheckResult::Terminate(recovery.calculated_size)
    }
}
