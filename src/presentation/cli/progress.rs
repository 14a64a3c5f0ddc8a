//! Progress reporting for CLI
//!
//! The teacher's `ProgressReporter` drove a byte-position bar fed by a
//! per-chunk callback from `ScanDeviceUseCase`. The streaming `Carver`
//! runs its whole forward pass in one blocking call with no such
//! callback (spec section 5: the only suspension point is
//! `BlockSource::read`, and cancellation is polled between windows, not
//! reported outward) — so this reports an indeterminate spinner while the
//! carve runs and a byte/file tally once it returns.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter using indicatif.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    fn spinner(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }

    pub fn for_carve(source_len: u64) -> Self {
        Self::spinner(&format!("Carving {} bytes...", source_len))
    }

    pub fn for_exfat_walk() -> Self {
        Self::spinner("Walking exFAT directory metadata...")
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
