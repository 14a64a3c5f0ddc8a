//! GIF detector
//!
//! Grounded in the teacher's `ImageCarver::find_gif_end`/`validate`, which
//! only scanned a fully-buffered slice for the `00 3B` trailer; this
//! reimplements GIF's actual block/sub-block framing so the carver can
//! advance one window at a time (spec section 4.3).

use crate::domain::entities::{DetectorState, FormatId, Recovery};
use crate::domain::services::{DataCheckResult, Detector, HeaderResult};

const HEADER_LEN: usize = 13; // 6-byte magic + 7-byte logical screen descriptor
const MAX_SIZE: u64 = 50 * 1024 * 1024;

pub struct GifDetector;

fn global_color_table_size(packed_fields: u8) -> u64 {
    if packed_fields & 0x80 != 0 {
        3 * (2u64 << (packed_fields & 0x07))
    } else {
        0
    }
}

impl Detector for GifDetector {
    fn format(&self) -> FormatId {
        FormatId::Gif
    }

    fn header_check(&self, window: &[u8], cursor: usize, _active: Option<&Recovery>) -> HeaderResult {
        if cursor + HEADER_LEN > window.len() {
            return HeaderResult::NoMatch;
        }
        let packed_fields = window[cursor + 10];
        let gct_size = global_color_table_size(packed_fields);

        HeaderResult::Start {
            extension: "gif",
            min_size: HEADER_LEN as u64 + 1,
            max_size: MAX_SIZE,
            initial_calc_size: HEADER_LEN as u64 + gct_size,
            state: DetectorState::Gif { in_sub_block: false },
            suppresses: None,
        }
    }

    fn data_check(&self, recovery: &mut Recovery, window: &[u8], window_base: u64) -> DataCheckResult {
        let DetectorState::Gif { mut in_sub_block } = recovery.state else {
            return DataCheckResult::Abort;
        };

        let mut size = recovery.calculated_size;
        loop {
            let Some(abs) = recovery.stream_start.checked_add(size) else {
                return DataCheckResult::Continue(size);
            };
            let Some(pos) = abs.checked_sub(window_base) else {
                return DataCheckResult::Continue(size);
            };
            let pos = pos as usize;

            if in_sub_block {
                let Some(&len) = window.get(pos) else {
                    recovery.state = DetectorState::Gif { in_sub_block };
                    return DataCheckResult::Continue(size);
                };
                if pos + 1 + len as usize > window.len() {
                    recovery.state = DetectorState::Gif { in_sub_block };
                    return DataCheckResult::Continue(size);
                }
                size += 1 + len as u64;
                if len == 0 {
                    in_sub_block = false;
                }
                continue;
            }

            let Some(&introducer) = window.get(pos) else {
                recovery.state = DetectorState::Gif { in_sub_block };
                return DataCheckResult::Continue(size);
            };

            match introducer {
                0x21 => {
                    if pos + 2 > window.len() {
                        recovery.state = DetectorState::Gif { in_sub_block };
                        return DataCheckResult::Continue(size);
                    }
                    size += 2;
                    in_sub_block = true;
                }
                0x2C => {
                    if pos + 10 > window.len() {
                        recovery.state = DetectorState::Gif { in_sub_block };
                        return DataCheckResult::Continue(size);
                    }
                    let packed = window[pos + 9];
                    let lct_size = global_color_table_size(packed);
                    let skip = 10 + lct_size + 1;
                    if pos as u64 + skip > window.len() as u64 {
                        recovery.state = DetectorState::Gif { in_sub_block };
                        return DataCheckResult::Continue(size);
                    }
                    size += skip;
                    in_sub_block = true;
                }
                0x3B => {
                    return DataCheckResult::Terminate(size + 1);
                }
                _ => return DataCheckResult::Abort,
            }
        }
    }

    fn file_check(&self, _recovery: &Recovery, tail: &[u8]) -> Option<u64> {
        tail.windows(2)
            .position(|w| w == [0x00, 0x3B])
            .map(|pos| pos as u64 + 2)
    }
}
