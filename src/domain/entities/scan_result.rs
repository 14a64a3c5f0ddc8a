//! Carve progress and result entities
//!
//! Adapted from the teacher's `ScanProgress`/`ScanResult`, which tracked
//! signature matches found by a one-pass scan; here they track artifacts
//! committed by the streaming carver, one pass that scans and carves at
//! once.

use super::recovered_file::CarvedFile;
use super::signature::FormatId;
use std::collections::HashMap;
use std::time::Duration;

/// Progress information reported while a carve is running.
#[derive(Debug, Clone)]
pub struct CarveProgress {
    pub total_bytes: u64,
    pub scanned_bytes: u64,
    pub files_committed: usize,
    pub estimated_remaining: Option<Duration>,
    pub speed_bps: u64,
}

impl CarveProgress {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            scanned_bytes: 0,
            files_committed: 0,
            estimated_remaining: None,
            speed_bps: 0,
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.scanned_bytes as f64 / self.total_bytes as f64) * 100.0
    }

    pub fn update(&mut self, scanned_bytes: u64, files_committed: usize, speed_bps: u64) {
        self.scanned_bytes = scanned_bytes;
        self.files_committed = files_committed;
        self.speed_bps = speed_bps;

        if speed_bps > 0 {
            let remaining_bytes = self.total_bytes.saturating_sub(scanned_bytes);
            let remaining_secs = remaining_bytes / speed_bps;
            self.estimated_remaining = Some(Duration::from_secs(remaining_secs));
        }
    }
}

/// Result of a complete carve pass over one `BlockSource`.
#[derive(Debug, Clone)]
pub struct CarveResult {
    source_path: String,
    total_bytes: u64,
    duration: Duration,
    committed_count: usize,
    committed_bytes: u64,
    type_counts: HashMap<FormatId, usize>,
    carved: Vec<CarvedFile>,
    errors: Vec<String>,
}

impl CarveResult {
    pub fn new(source_path: String, total_bytes: u64) -> Self {
        Self {
            source_path,
            total_bytes,
            duration: Duration::default(),
            committed_count: 0,
            committed_bytes: 0,
            type_counts: HashMap::new(),
            carved: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_committed(&mut self, format: FormatId, size: u64) {
        *self.type_counts.entry(format).or_insert(0) += 1;
        self.committed_count += 1;
        self.committed_bytes += size;
    }

    pub fn add_carved(&mut self, file: CarvedFile) {
        self.carved.push(file);
    }

    pub fn carved(&self) -> &[CarvedFile] {
        &self.carved
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn committed_count(&self) -> usize {
        self.committed_count
    }

    pub fn committed_bytes(&self) -> u64 {
        self.committed_bytes
    }

    pub fn count_for_format(&self, format: FormatId) -> usize {
        self.type_counts.get(&format).copied().unwrap_or(0)
    }

    pub fn type_counts(&self) -> &HashMap<FormatId, usize> {
        &self.type_counts
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Carved {} ({} bytes) in {:.2}s\n",
            self.source_path,
            self.total_bytes,
            self.duration.as_secs_f64()
        );
        summary.push_str(&format!(
            "Committed {} files ({} bytes):\n",
            self.committed_count, self.committed_bytes
        ));

        for (format, count) in &self.type_counts {
            summary.push_str(&format!("  - {}: {}\n", format, count));
        }

        if !self.errors.is_empty() {
            summary.push_str(&format!("\nEncountered {} errors\n", self.errors.len()));
        }

        summary
    }
}
