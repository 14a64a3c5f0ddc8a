//! End-to-end carve and exFAT-walk tests
//!
//! Drives the whole pipeline through its public use cases against a real
//! temporary file, mirroring the six concrete scenarios and the exFAT
//! name-concatenation property: S1 GIF round-trip, S2 PSB size
//! calculation, S3 PNG chunk-size calculation, S4 ICC size calculation,
//! S5 exFAT single-file enumeration/extraction, S6 overlapping GIF
//! headers, long exFAT file names spanning multiple name-extension
//! entries, and a PSB recovery suppressing an embedded PNG header.

use argos_carver::application::dto::{CarveOptions, ExfatOptions};
use argos_carver::application::{CarveDeviceUseCase, WalkExfatUseCase};
use argos_carver::domain::repositories::{ArtifactSink, BlockSource};
use argos_carver::infrastructure::block_device::FileBlockSource;
use argos_carver::infrastructure::detectors::{default_detectors, default_registry};
use argos_carver::infrastructure::file_systems::ExfatWalker;
use argos_carver::infrastructure::persistence::LocalArtifactSink;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::{tempdir, NamedTempFile};

const WINDOW_SIZE: u32 = 4096;

fn carve(buffer: &[u8]) -> (tempfile::TempDir, argos_carver::domain::entities::CarveResult) {
    let mut image = NamedTempFile::new().unwrap();
    image.write_all(buffer).unwrap();
    image.flush().unwrap();

    let out = tempdir().unwrap();
    let source = FileBlockSource::open(image.path().to_str().unwrap()).unwrap();
    let sink = LocalArtifactSink::new(out.path()).unwrap();
    let options = CarveOptions::new(image.path().to_str().unwrap()).with_window_size(WINDOW_SIZE);

    let use_case = CarveDeviceUseCase::new(default_registry().unwrap(), default_detectors());
    let result = use_case.execute(&source, &sink, &options).unwrap();
    (out, result)
}

fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32fast::hash(&[kind.as_slice(), data].concat()).to_be_bytes());
    out
}

fn psb_section(len: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(len as u64).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

// ============================================================================
// S1: GIF round-trip
// ============================================================================

#[test]
fn s1_gif_round_trip_is_byte_identical() {
    let mut buffer = vec![0u8; 1024];
    let gif_start = buffer.len();
    buffer.extend_from_slice(b"GIF89a");
    buffer.extend_from_slice(&[0, 0, 0, 0, 0x00, 0, 0]); // LSD, no global color table
    buffer.push(0x3B);
    let original = buffer[gif_start..].to_vec();
    buffer.resize(WINDOW_SIZE as usize, 0);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "gif");
    assert_eq!(carved.size(), 14);
    assert_eq!(carved.source_offset(), gif_start as u64);

    let bytes = fs::read(carved.saved_path()).unwrap();
    assert_eq!(bytes, original);
    drop(out);
}

// ============================================================================
// S2: PSB size calculation
// ============================================================================

#[test]
fn s2_psb_size_is_header_plus_sections_plus_clamped_image_data() {
    let width = 10u32;
    let height = 20u32;
    let channels = 3u16;
    let depth = 8u16;
    let image_data_size_max = (width * height * channels as u32 * (depth as u32 / 8)) as usize;

    let mut buffer = vec![0u8; 0x1A];
    buffer[0..5].copy_from_slice(&[0x8B, 0x50, 0x53, 0x00, 0x02]);
    BigEndian::write_u16(&mut buffer[12..14], channels);
    BigEndian::write_u32(&mut buffer[14..18], height);
    BigEndian::write_u32(&mut buffer[18..22], width);
    BigEndian::write_u16(&mut buffer[22..24], depth);

    buffer.extend(psb_section(8, &[0u8; 8]));
    buffer.extend(psb_section(8, &[0u8; 8]));
    buffer.extend(psb_section(8, &[0u8; 8]));
    let raw: Vec<u8> = (0..image_data_size_max).map(|i| (i % 251) as u8).collect();
    buffer.extend_from_slice(&raw);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "psb");
    assert_eq!(carved.size(), 0x1A + 3 * 16 + image_data_size_max as u64);
    drop(out);
}

// ============================================================================
// S3: PNG chunk-size calculation
// ============================================================================

#[test]
fn s3_png_size_equals_magic_plus_framed_chunks() {
    let mut buffer = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    buffer.extend(png_chunk(b"IHDR", &[0u8; 13]));
    buffer.extend(png_chunk(b"IDAT", &[0u8; 3]));
    buffer.extend(png_chunk(b"IEND", &[]));
    let expected_size = 8 + (13 + 12) + (3 + 12) + (0 + 12);
    buffer.resize(WINDOW_SIZE as usize, 0);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "png");
    assert_eq!(carved.size(), expected_size as u64);
    drop(out);
}

// ============================================================================
// S4: ICC size calculation
// ============================================================================

#[test]
fn s4_icc_size_equals_declared_header_size() {
    let mut buffer = vec![0u8; 0xC0];
    BigEndian::write_u32(&mut buffer[0..4], 0xC0);
    buffer[36..40].copy_from_slice(b"acsp");
    buffer.resize(WINDOW_SIZE as usize, 0);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "icc");
    assert_eq!(carved.size(), 0xC0);
    drop(out);
}

// ============================================================================
// S5 / exFAT property 7: volume building helper
// ============================================================================

fn exfat_image_with_one_file(filename: &str, file_size: u64) -> Vec<u8> {
    let cluster_size: usize = 512;
    let clusters_needed = (file_size as usize).div_ceil(cluster_size).max(1);
    let mut image = vec![0u8; cluster_size * (3 + clusters_needed)];

    image[3..11].copy_from_slice(b"EXFAT   ");
    LittleEndian::write_u32(&mut image[80..84], 1); // fat_offset (sector 1)
    LittleEndian::write_u32(&mut image[84..88], 1); // fat_length (1 sector)
    LittleEndian::write_u32(&mut image[88..92], 2); // clus_blocknr (sector 2)
    LittleEndian::write_u32(&mut image[92..96], (2 + clusters_needed) as u32); // total_clusters
    LittleEndian::write_u32(&mut image[96..100], 2); // rootdir_clusnr
    image[108] = 9; // blocksize_bits -> 512-byte sectors
    image[109] = 0; // block_per_clus_bits -> 1 sector per cluster
    LittleEndian::write_u16(&mut image[510..512], 0xAA55);

    let fat_offset = 512;
    LittleEndian::write_u32(&mut image[fat_offset + 2 * 4..fat_offset + 2 * 4 + 4], 0xFFFFFFFF); // root dir cluster -> EOC

    let data_clusters: Vec<u32> = (0..clusters_needed as u32).map(|i| 3 + i).collect();
    for (i, &cluster) in data_clusters.iter().enumerate() {
        let next = if i + 1 < data_clusters.len() { data_clusters[i + 1] } else { 0xFFFFFFFF };
        let entry_off = fat_offset + cluster as usize * 4;
        LittleEndian::write_u32(&mut image[entry_off..entry_off + 4], next);
    }

    let dir_offset = 2 * 512;
    let name_units: Vec<u16> = filename.encode_utf16().collect();
    let name_entries = name_units.len().div_ceil(15).max(1) as u8;

    let file_entry = &mut image[dir_offset..dir_offset + 32];
    file_entry[0] = 0x85; // File, live
    file_entry[1] = 1 + name_entries;

    let stream_off = dir_offset + 32;
    let stream_entry = &mut image[stream_off..stream_off + 32];
    stream_entry[0] = 0xC0; // Stream extension, live
    LittleEndian::write_u32(&mut stream_entry[20..24], data_clusters[0]);
    LittleEndian::write_u64(&mut stream_entry[24..32], file_size);

    let mut offset = stream_off + 32;
    for chunk in name_units.chunks(15) {
        let entry = &mut image[offset..offset + 32];
        entry[0] = 0xC1; // File name extension, live
        for (i, &unit) in chunk.iter().enumerate() {
            LittleEndian::write_u16(&mut entry[2 + i * 2..4 + i * 2], unit);
        }
        offset += 32;
    }

    let payload: Vec<u8> = (0..file_size).map(|i| (i % 251) as u8).collect();
    let mut written = 0usize;
    for &cluster in &data_clusters {
        let data_offset = cluster as usize * 512;
        let take = (file_size as usize - written).min(512);
        image[data_offset..data_offset + take].copy_from_slice(&payload[written..written + take]);
        written += take;
    }

    image
}

// ============================================================================
// S5: exFAT single-file enumeration and extraction
// ============================================================================

#[test]
fn s5_exfat_enumerates_and_extracts_a_single_file() {
    let image_bytes = exfat_image_with_one_file("HELLO.TXT", 5000);

    let mut image_file = NamedTempFile::new().unwrap();
    image_file.write_all(&image_bytes).unwrap();
    image_file.flush().unwrap();

    let source = Arc::new(FileBlockSource::open(image_file.path().to_str().unwrap()).unwrap());
    let walker = ExfatWalker::new(source, false).unwrap();
    let use_case = WalkExfatUseCase::new(&walker);

    let entries = use_case.list(&ExfatOptions::new(false)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].filename.as_deref(), Some("HELLO.TXT"));
    assert_eq!(entries[0].size, 5000);

    let out = tempdir().unwrap();
    let sink = LocalArtifactSink::new(out.path()).unwrap();
    let extracted = use_case.extract_all(&sink, &ExfatOptions::new(false)).unwrap();
    assert_eq!(extracted, 1);
    assert_eq!(sink.files_written(), 1);

    let expected: Vec<u8> = (0..5000u64).map(|i| (i % 251) as u8).collect();
    let written = fs::read_dir(out.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert_eq!(fs::read(written).unwrap(), expected);
}

// ============================================================================
// S6: overlapping GIF headers, only the first is carved
// ============================================================================

#[test]
fn s6_overlapping_gif_headers_yield_a_single_artifact_at_the_first_offset() {
    let mut buffer = vec![0u8; 100];
    let first_offset = buffer.len();
    buffer.extend_from_slice(b"GIF89a");
    buffer.extend_from_slice(&[0, 0, 0, 0, 0x00, 0, 0]); // LSD, no GCT
    buffer.push(0x21); // extension introducer
    buffer.push(0xF9); // label byte (graphic control, arbitrary)
    buffer.push(6); // sub-block length
    buffer.extend_from_slice(b"GIF89a"); // a second header embedded as opaque sub-block data
    buffer.push(0x00); // sub-block terminator
    buffer.push(0x3B); // trailer
    buffer.resize(WINDOW_SIZE as usize, 0);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "gif");
    assert_eq!(carved.source_offset(), first_offset as u64);
    assert_eq!(carved.size(), 13 + 2 + 7 + 1 + 1);
    drop(out);
}

// ============================================================================
// PSB suppresses an embedded PNG header while its recovery is active
// ============================================================================

#[test]
fn psb_recovery_suppresses_an_embedded_png_header_spanning_a_window_boundary() {
    let mut buffer = vec![0u8; 0x1A];
    buffer[0..5].copy_from_slice(&[0x8B, 0x50, 0x53, 0x00, 0x02]);
    BigEndian::write_u16(&mut buffer[12..14], 3); // channels
    BigEndian::write_u32(&mut buffer[14..18], 20); // height
    BigEndian::write_u32(&mut buffer[18..22], 0); // width 0 keeps image_data_size_max at 0
    BigEndian::write_u16(&mut buffer[22..24], 8); // depth

    buffer.extend(psb_section(974, &[0u8; 974]));
    buffer.extend(psb_section(1000, &[0u8; 1000]));
    let header_and_first_two_sections_len = buffer.len();
    assert_eq!(header_and_first_two_sections_len, 0x1A + 982 + 1008);

    // The third section's payload is long enough that its tail lands past
    // the first WINDOW_SIZE bytes, so the embedded PNG header below is only
    // scanned once the PSB recovery opened at offset 0 is already active.
    let mut section3_payload = vec![0u8; 2976];
    let embed_at = 4200 - (header_and_first_two_sections_len + 8);
    let mut png_bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png_bytes.extend(png_chunk(b"IHDR", &[0u8; 13]));
    section3_payload[embed_at..embed_at + png_bytes.len()].copy_from_slice(&png_bytes);
    buffer.extend(psb_section(2976, &section3_payload));
    assert_eq!(buffer.len(), 5000);

    let (out, result) = carve(&buffer);

    assert_eq!(result.committed_count(), 1);
    let carved = &result.carved()[0];
    assert_eq!(carved.format().extension(), "psb");
    assert_eq!(carved.size(), 5000);
    drop(out);
}

// ============================================================================
// Property 7: exFAT name concatenation across multiple extension entries
// ============================================================================

#[test]
fn exfat_concatenates_a_name_spanning_two_extension_entries() {
    let long_name = "A_FILE_NAME_LONGER_THAN_FIFTEEN_UTF16_UNITS.TXT";
    assert!(long_name.encode_utf16().count() > 15);

    let image_bytes = exfat_image_with_one_file(long_name, 10);
    let mut image_file = NamedTempFile::new().unwrap();
    image_file.write_all(&image_bytes).unwrap();
    image_file.flush().unwrap();

    let source = Arc::new(FileBlockSource::open(image_file.path().to_str().unwrap()).unwrap());
    let walker = ExfatWalker::new(source, false).unwrap();
    let use_case = WalkExfatUseCase::new(&walker);

    let entries = use_case.list(&ExfatOptions::new(false)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].filename.as_deref(), Some(long_name));
}
