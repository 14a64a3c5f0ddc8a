//! MPEG detector
//!
//! New relative to the teacher, which shipped no video carver; grounded in
//! `SignatureRegistry`'s table-of-patterns idiom and `FileCarver`'s
//! size-determination contract, extended to the end-code scan spec
//! section 4.3 describes. The per-start-code reserved-bit validation below
//! reproduces `file_mpg.c`'s `header_check_mpg_{Pack,System,Sequence}` and
//! `header_check_mpg4_ElemVideo` bit masks exactly, since a bare 4-byte
//! start code is far too common to anchor a recovery on by itself.

use crate::domain::entities::{DetectorState, FormatId, Recovery};
use crate::domain::services::{DataCheckResult, Detector, HeaderResult};

const MAX_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// The four MPEG start codes the registry anchors on: sequence header,
/// MPEG-4 visual object, pack, and system headers.
pub const START_CODES: [[u8; 4]; 4] = [
    [0x00, 0x00, 0x01, 0xB3],
    [0x00, 0x00, 0x01, 0xB5],
    [0x00, 0x00, 0x01, 0xBA],
    [0x00, 0x00, 0x01, 0xBB],
];

const PROGRAM_END: [u8; 4] = [0x00, 0x00, 0x01, 0xB9];
const SEQUENCE_END: [u8; 4] = [0x00, 0x00, 0x01, 0xB7];

/// MPEG-1 sequence header (start code `0x...B3`): horizontal/vertical size,
/// aspect ratio, picture rate, and bit rate fields must all be non-reserved.
fn validate_sequence(b: &[u8]) -> bool {
    (((b[4] as u16) << 4) + (b[5] as u16 >> 4)) > 0
        && (((b[5] & 0x0f) as u16) << 8) + b[6] as u16 > 0
        && (b[7] >> 4) != 0
        && (b[7] >> 4) != 15
        && (b[7] & 0x0f) != 0
        && (b[7] & 0x0f) != 15
        && (b[8] != 0 || b[9] != 0 || (b[10] & 0xc0) != 0)
        && (b[10] & 0x20) == 0x20
}

/// MPEG-4 elementary video visual-object start code (`0x...B5`).
fn validate_elem_video(b: &[u8]) -> bool {
    (b[4] & 0xf0) == 0x80
        && (((b[4] >> 3) & 0x0f) == 1 || ((b[4] >> 3) & 0x0f) == 2)
        && (b[4] & 0x7) != 0
        && (b[5] >> 4) != 0
        && (b[5] >> 4) != 0x0f
}

/// MPEG-1 pack start code or MPEG-2 program-stream system header (`0x...BA`).
fn validate_pack(b: &[u8]) -> bool {
    let mpeg1 = (b[4] & 0xF1) == 0x21 && (b[6] & 1) == 1 && (b[8] & 1) == 1 && (b[9] & 0x80) == 0x80 && (b[11] & 1) == 1;
    let mpeg2 = (b[4] & 0xc4) == 0x44 && (b[6] & 4) == 4 && (b[8] & 4) == 4;
    mpeg1 || mpeg2
}

/// MPEG-1 system header start code (`0x...BB`).
fn validate_system(b: &[u8]) -> bool {
    (b[6] & 0x80) == 0x80 && (b[8] & 0x01) == 0x01 && b[11] == 0xff
}

pub struct MpegDetector;

impl Detector for MpegDetector {
    fn format(&self) -> FormatId {
        FormatId::Mpeg
    }

    fn header_check(&self, window: &[u8], cursor: usize, _active: Option<&Recovery>) -> HeaderResult {
        // Every validator reads up to buffer[11] relative to the start code.
        if cursor + 12 > window.len() {
            return HeaderResult::NoMatch;
        }
        let b = &window[cursor..];
        let accepted = match (b[0], b[1], b[2], b[3]) {
            (0x00, 0x00, 0x01, 0xB3) => validate_sequence(b),
            (0x00, 0x00, 0x01, 0xB5) => validate_elem_video(b),
            (0x00, 0x00, 0x01, 0xBA) => validate_pack(b),
            (0x00, 0x00, 0x01, 0xBB) => validate_system(b),
            _ => false,
        };
        if !accepted {
            return HeaderResult::NoMatch;
        }
        HeaderResult::Start {
            extension: "mpg",
            min_size: 4,
            max_size: MAX_SIZE,
            initial_calc_size: 4,
            state: DetectorState::Mpeg,
            suppresses: None,
        }
    }

    fn data_check(&self, recovery: &mut Recovery, window: &[u8], window_base: u64) -> DataCheckResult {
        let Some(abs) = recovery.stream_start.checked_add(recovery.calculated_size) else {
            return DataCheckResult::Continue(recovery.calculated_size);
        };
        let Some(start) = abs.checked_sub(window_base).map(|v| v as usize) else {
            return DataCheckResult::Continue(recovery.calculated_size);
        };
        if start >= window.len() {
            return DataCheckResult::Continue(recovery.calculated_size);
        }

        // Leave enough slack that a split end-code pattern at the tail of
        // this window is picked up whole on the next call instead of
        // being missed here.
        let scan_end = window.len().saturating_sub(8);
        if start < scan_end {
            for pos in start..scan_end {
                if window[pos..pos + 4] == PROGRAM_END {
                    let end_abs = window_base + pos as u64 + 4;
                    return DataCheckResult::Terminate(end_abs - recovery.stream_start);
                }
                if window[pos..pos + 4] == SEQUENCE_END && window[pos + 4..pos + 8] == PROGRAM_END {
                    let end_abs = window_base + pos as u64 + 8;
                    return DataCheckResult::Terminate(end_abs - recovery.stream_start);
                }
            }
        }

        let scanned_abs = window_base + scan_end.max(start) as u64;
        let new_size = scanned_abs.saturating_sub(recovery.stream_start);
        DataCheckResult::Continue(recovery.calculated_size.max(new_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a 12-byte buffer: the 4-byte start code followed by the
    /// reserved-bit payload each validator inspects (`buffer[4..12]`).
    fn header(code: [u8; 4], tail: [u8; 8]) -> [u8; 12] {
        let mut buf = [0u8; 12];
        buf[..4].copy_from_slice(&code);
        buf[4..].copy_from_slice(&tail);
        buf
    }

    #[test]
    fn header_check_accepts_a_well_formed_sequence_header() {
        let buf = header([0x00, 0x00, 0x01, 0xB3], [0x01, 0x00, 0x01, 0x11, 0x01, 0x00, 0x20, 0x00]);
        assert!(matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::Start { .. }));
    }

    #[test]
    fn header_check_accepts_a_well_formed_elem_video_header() {
        let buf = header([0x00, 0x00, 0x01, 0xB5], [0x89, 0x10, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::Start { .. }));
    }

    #[test]
    fn header_check_accepts_a_well_formed_pack_header() {
        let buf = header([0x00, 0x00, 0x01, 0xBA], [0x21, 0x00, 0x01, 0x00, 0x01, 0x80, 0x00, 0x01]);
        assert!(matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::Start { .. }));
    }

    #[test]
    fn header_check_accepts_a_well_formed_system_header() {
        let buf = header([0x00, 0x00, 0x01, 0xBB], [0, 0, 0x80, 0, 0x01, 0, 0, 0xff]);
        assert!(matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::Start { .. }));
    }

    #[test]
    fn header_check_rejects_a_bare_start_code_with_no_reserved_bits_set() {
        for code in START_CODES {
            let buf = header(code, [0u8; 8]);
            assert!(
                matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::NoMatch),
                "start code {code:?} should not match on reserved bits alone"
            );
        }
    }

    #[test]
    fn header_check_rejects_a_truncated_window() {
        let buf = [0x00, 0x00, 0x01, 0xBA, 0x21, 0x00, 0x01, 0x00, 0x01, 0x80, 0x00];
        assert!(matches!(MpegDetector.header_check(&buf, 0, None), HeaderResult::NoMatch));
    }

    #[test]
    fn data_check_terminates_on_program_end_code() {
        let mut data = vec![0x00, 0x00, 0x01, 0xBA];
        data.extend_from_slice(&[0u8; 20]);
        data.extend_from_slice(&PROGRAM_END);
        data.extend_from_slice(&[0u8; 8]);

        let mut recovery = Recovery::new(1, FormatId::Mpeg, "mpg", 0, 4, 4, MAX_SIZE, DetectorState::Mpeg);
        match MpegDetector.data_check(&mut recovery, &data, 0) {
            DataCheckResult::Terminate(size) => assert_eq!(size, 24 + 4),
            other => panic!("expected Terminate, got {:?}", other),
        }
    }
}
