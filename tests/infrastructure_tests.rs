//! Infrastructure layer tests
//!
//! Tests for the block source implementations, the default registry/detector
//! wiring, and the local artifact sink, exercised through their public APIs
//! rather than reaching into private fields.

use argos_carver::domain::entities::FormatId;
use argos_carver::domain::repositories::{ArtifactSink, BlockSource, IoError};
use argos_carver::infrastructure::block_device::{FileBlockSource, MmapBlockSource};
use argos_carver::infrastructure::detectors::{default_detectors, default_registry};
use argos_carver::infrastructure::persistence::LocalArtifactSink;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// ============================================================================
// FileBlockSource
// ============================================================================

#[test]
fn open_nonexistent_path_is_not_found() {
    let err = FileBlockSource::open("/definitely/not/a/real/path").unwrap_err();
    assert!(matches!(err, IoError::NotFound(_)));
}

#[test]
fn open_reports_length_and_sector_size_for_a_plain_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0u8; 4096]).unwrap();
    file.flush().unwrap();

    let source = FileBlockSource::open(file.path().to_str().unwrap()).unwrap();
    assert_eq!(source.length(), 4096);
    assert_eq!(source.sector_size(), 512);
    assert_eq!(source.info().sector_count(), 8);
}

#[test]
fn read_returns_requested_bytes_at_offset() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"0123456789ABCDEF").unwrap();
    file.flush().unwrap();

    let source = FileBlockSource::open(file.path().to_str().unwrap()).unwrap();
    let mut buf = [0u8; 4];
    let n = source.read(10, &mut buf).unwrap();
    assert_eq!(n, 4);
    assert_eq!(&buf, b"ABCD");
}

#[test]
fn read_past_length_is_an_invalid_offset() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[1u8; 8]).unwrap();
    file.flush().unwrap();

    let source = FileBlockSource::open(file.path().to_str().unwrap()).unwrap();
    let mut buf = [0u8; 4];
    let err = source.read(100, &mut buf).unwrap_err();
    assert!(matches!(err, IoError::InvalidOffset { offset: 100, length: 8 }));
}

#[test]
fn read_short_at_end_of_stream() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[7u8; 10]).unwrap();
    file.flush().unwrap();

    let source = FileBlockSource::open(file.path().to_str().unwrap()).unwrap();
    let mut buf = [0u8; 16];
    let n = source.read(4, &mut buf).unwrap();
    assert_eq!(n, 6);
}

// ============================================================================
// FileBlockSource vs. MmapBlockSource agreement
// ============================================================================

#[test]
fn file_and_mmap_sources_read_identical_bytes() {
    let mut file = NamedTempFile::new().unwrap();
    let payload: Vec<u8> = (0..2000u32).map(|i| (i % 256) as u8).collect();
    file.write_all(&payload).unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    let file_source = FileBlockSource::open(path).unwrap();
    let mmap_source = MmapBlockSource::open(path).unwrap();

    let mut a = [0u8; 500];
    let mut b = [0u8; 500];
    file_source.read(777, &mut a).unwrap();
    mmap_source.read(777, &mut b).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Default registry / detector wiring
// ============================================================================

#[test]
fn default_registry_registers_one_signature_per_mpeg_start_code_plus_the_rest() {
    let registry = default_registry().unwrap();
    // 2 GIF + 3 chunked (PNG/MNG/JNG) + 4 MPEG + 1 ICC + 1 PSB.
    assert_eq!(registry.signature_count(), 11);
}

#[test]
fn default_detectors_cover_every_format_the_registry_anchors() {
    let registry = default_registry().unwrap();
    let detectors = default_detectors();
    let covered: std::collections::HashSet<FormatId> = detectors.iter().map(|d| d.format()).collect();
    for sig in registry.all_signatures() {
        assert!(covered.contains(&sig.format()), "missing detector for {:?}", sig.format());
    }
}

// ============================================================================
// LocalArtifactSink
// ============================================================================

#[test]
fn sink_creates_its_output_directory_if_missing() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested").join("out");
    assert!(!nested.exists());
    let sink = LocalArtifactSink::new(&nested).unwrap();
    assert_eq!(sink.output_dir(), nested);
    assert!(nested.exists());
}

#[test]
fn sink_tracks_files_and_bytes_written_across_multiple_artifacts() {
    let dir = tempdir().unwrap();
    let sink = LocalArtifactSink::new(dir.path()).unwrap();

    let mut w1 = sink.open(1, "gif").unwrap();
    w1.write(b"GIF89a").unwrap();
    w1.close(None, None).unwrap();

    let mut w2 = sink.open(2, "png").unwrap();
    w2.write(b"\x89PNG\r\n\x1a\n").unwrap();
    w2.close(None, None).unwrap();

    assert_eq!(sink.files_written(), 2);
    assert_eq!(sink.bytes_written(), 6 + 8);
}

#[test]
fn truncate_shrinks_an_already_written_artifact() {
    let dir = tempdir().unwrap();
    let sink = LocalArtifactSink::new(dir.path()).unwrap();
    let mut writer = sink.open(1, "icc").unwrap();
    writer.write(&[0xAB; 128]).unwrap();
    writer.truncate(64).unwrap();
    let path = writer.close(None, None).unwrap();
    assert_eq!(fs::read(&path).unwrap().len(), 64);
}

#[test]
fn close_applies_source_timestamps() {
    let dir = tempdir().unwrap();
    let sink = LocalArtifactSink::new(dir.path()).unwrap();
    let mut writer = sink.open(1, "bin").unwrap();
    writer.write(b"hello").unwrap();
    let path = writer.close(Some(1_000_000_000), Some(1_000_000_000)).unwrap();

    let metadata = fs::metadata(&path).unwrap();
    let mtime = metadata.modified().unwrap();
    let expected = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
    assert_eq!(mtime, expected);
}
