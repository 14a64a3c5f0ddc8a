//! Photoshop Big (PSB) detector
//!
//! Grounded in the teacher's `NtfsBootSector` parser, which read a run of
//! fixed-width fields sequentially off a `Cursor` and tracked "where we
//! are" as explicit state; PSB's four length-prefixed sections are walked
//! the same way, one `data_check` call advancing through however many
//! sections fit in the current window (spec section 4.3). This is also
//! the pack's concrete example of a compound-document detector that
//! suppresses an embedded format while its recovery is active, stood in
//! for the unported SolidWorks/PNG case the spec cites.

use crate::domain::entities::{DetectorState, FormatId, PsbSection, Recovery};
use crate::domain::services::{DataCheckResult, Detector, HeaderResult};
use byteorder::{BigEndian, ByteOrder};

const SIGNATURE_LEN: usize = 5; // "8BPS\x00\x02"
const FIXED_HEADER_LEN: u64 = 0x1A; // signature + version + reserved + channels/dims/depth/mode
const MAX_SIZE: u64 = 4u64 * 1024 * 1024 * 1024;

pub struct PsbDetector;

impl Detector for PsbDetector {
    fn format(&self) -> FormatId {
        FormatId::Psb
    }

    fn header_check(&self, window: &[u8], cursor: usize, _active: Option<&Recovery>) -> HeaderResult {
        if cursor + FIXED_HEADER_LEN as usize > window.len() {
            return HeaderResult::NoMatch;
        }
        // Fixed header past the 5-byte signature: 6 reserved, 2 channels,
        // 4 height, 4 width, 2 depth, 2 color mode (total 0x1A - 5 = 21... laid
        // out as documented in the Photoshop file format spec).
        let channels = BigEndian::read_u16(&window[cursor + 12..cursor + 14]) as u64;
        let height = BigEndian::read_u32(&window[cursor + 14..cursor + 18]) as u64;
        let width = BigEndian::read_u32(&window[cursor + 18..cursor + 22]) as u64;
        let depth = BigEndian::read_u16(&window[cursor + 22..cursor + 24]) as u64;

        let image_data_size_max = width
            .saturating_mul(height)
            .saturating_mul(channels.max(1))
            .saturating_mul((depth.max(8)) / 8);

        HeaderResult::Start {
            extension: "psb",
            min_size: FIXED_HEADER_LEN,
            max_size: MAX_SIZE,
            initial_calc_size: FIXED_HEADER_LEN,
            state: DetectorState::Psb {
                section: PsbSection::ColorMode,
                image_data_size_max,
            },
            suppresses: Some(FormatId::Png),
        }
    }

    fn data_check(&self, recovery: &mut Recovery, window: &[u8], window_base: u64) -> DataCheckResult {
        let DetectorState::Psb { mut section, image_data_size_max } = recovery.state else {
            return DataCheckResult::Abort;
        };

        let mut size = recovery.calculated_size;
        loop {
            if section == PsbSection::ImageData {
                recovery.state = DetectorState::Psb { section, image_data_size_max };
                return DataCheckResult::Terminate(size);
            }

            let Some(abs) = recovery.stream_start.checked_add(size) else {
                recovery.state = DetectorState::Psb { section, image_data_size_max };
                return DataCheckResult::Continue(size);
            };
            let Some(pos) = abs.checked_sub(window_base).map(|v| v as usize) else {
                recovery.state = DetectorState::Psb { section, image_data_size_max };
                return DataCheckResult::Continue(size);
            };

            if pos + 8 > window.len() {
                recovery.state = DetectorState::Psb { section, image_data_size_max };
                return DataCheckResult::Continue(size);
            }

            let length = BigEndian::read_u64(&window[pos..pos + 8]);
            if length < 4 {
                return DataCheckResult::Abort;
            }

            if pos as u64 + 8 + length > window.len() as u64 {
                recovery.state = DetectorState::Psb { section, image_data_size_max };
                return DataCheckResult::Continue(size);
            }

            size += 8 + length;
            section = match section {
                PsbSection::ColorMode => PsbSection::ImageResources,
                PsbSection::ImageResources => PsbSection::LayerInfo,
                PsbSection::LayerInfo => PsbSection::ImageData,
                PsbSection::ImageData => unreachable!(),
            };
        }
    }

    fn file_check(&self, recovery: &Recovery, tail: &[u8]) -> Option<u64> {
        let DetectorState::Psb { image_data_size_max, .. } = recovery.state else {
            return None;
        };
        let min = recovery.calculated_size;
        let max = recovery.calculated_size.saturating_add(image_data_size_max);
        let available = recovery.calculated_size + tail.len() as u64;
        Some(available.clamp(min, max))
    }
}
