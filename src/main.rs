//! Argos - Signature-Driven File Carver
//!
//! Carves recoverable files out of a device or image by signature, or
//! walks an exFAT volume's own directory metadata.

use anyhow::{Context, Result};
use argos_carver::application::dto::{CarveOptions, ExfatOptions};
use argos_carver::application::{CarveDeviceUseCase, WalkExfatUseCase};
use argos_carver::domain::repositories::{ArtifactSink, BlockSource};
use argos_carver::infrastructure::block_device::FileBlockSource;
use argos_carver::infrastructure::detectors::{default_detectors, default_registry};
use argos_carver::infrastructure::file_systems::ExfatWalker;
use argos_carver::infrastructure::persistence::LocalArtifactSink;
use argos_carver::presentation::cli::{parse_formats, Cli, Commands, ProgressReporter};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let outcome = match cli.command {
        Commands::Carve { source, out, with, window_mb } => run_carve(&source, &out, with, window_mb),
        Commands::ExfatList { source, include_deleted } => run_exfat_list(&source, include_deleted),
        Commands::ExfatExtract { source, out, include_deleted } => {
            run_exfat_extract(&source, &out, include_deleted)
        }
        Commands::ListSignatures => {
            list_signatures();
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Maps a failure to the exit codes spec section 6 cites: 1 = I/O error,
/// 2 = invalid source. User cancellation (3) has no path here since this
/// CLI never installs a cancel handler.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    use argos_carver::domain::repositories::{FileSystemError, IoError};
    use argos_carver::domain::services::CarverError;

    if err.downcast_ref::<IoError>().is_some() || err.downcast_ref::<CarverError>().is_some() {
        return 1;
    }
    if let Some(e) = err.downcast_ref::<FileSystemError>() {
        return match e {
            FileSystemError::InvalidBootSector(_) | FileSystemError::NoFileSystem => 2,
            _ => 1,
        };
    }
    1
}

fn run_carve(source_path: &str, out: &std::path::Path, with: Option<Vec<String>>, window_mb: usize) -> Result<()> {
    println!("Carving {}", source_path);

    let source =
        FileBlockSource::open(source_path).context("failed to open source. Check the path and read permissions")?;
    println!(
        "Source size: {} ({} bytes)",
        format_bytes(source.length()),
        source.length()
    );

    let sink = LocalArtifactSink::new(out).context("failed to create output directory")?;
    let formats = parse_formats(with);
    let options = CarveOptions::new(source_path)
        .with_window_size((window_mb * 1024 * 1024) as u32)
        .with_formats(formats);

    let progress = ProgressReporter::for_carve(source.length());
    let use_case = CarveDeviceUseCase::new(default_registry()?, default_detectors());
    let result = use_case.execute(&source, &sink, &options)?;
    progress.finish("Carve complete");

    println!(
        "\nCommitted {} files ({})",
        result.committed_count(),
        format_bytes(result.committed_bytes())
    );
    for (format, count) in result.type_counts() {
        println!("  {}: {}", format, count);
    }
    if result.has_errors() {
        println!("\n{} errors encountered", result.errors().len());
    }

    Ok(())
}

fn run_exfat_list(source_path: &str, include_deleted: bool) -> Result<()> {
    let source = Arc::new(FileBlockSource::open(source_path).context("failed to open source")?);
    let walker = ExfatWalker::new(source, include_deleted)?;
    let use_case = WalkExfatUseCase::new(&walker);

    let progress = ProgressReporter::for_exfat_walk();
    let entries = use_case.list(&ExfatOptions::new(include_deleted))?;
    progress.finish("Walk complete");

    println!("{} entries:", entries.len());
    for entry in &entries {
        println!(
            "  {:>10}  {}{}",
            format_bytes(entry.size),
            entry.filename.as_deref().unwrap_or("(unnamed)"),
            if entry.is_live { "" } else { "  [deleted]" }
        );
    }

    Ok(())
}

fn run_exfat_extract(source_path: &str, out: &std::path::Path, include_deleted: bool) -> Result<()> {
    let source = Arc::new(FileBlockSource::open(source_path).context("failed to open source")?);
    let walker = ExfatWalker::new(source, include_deleted)?;
    let sink = LocalArtifactSink::new(out).context("failed to create output directory")?;
    let use_case = WalkExfatUseCase::new(&walker);

    let progress = ProgressReporter::for_exfat_walk();
    let extracted = use_case.extract_all(&sink, &ExfatOptions::new(include_deleted))?;
    progress.finish("Extraction complete");

    println!("Extracted {} files to {}", extracted, out.display());
    Ok(())
}

fn list_signatures() {
    let registry = match default_registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to build registry: {e}");
            return;
        }
    };
    println!("{} signatures registered:", registry.signature_count());
    for sig in registry.all_signatures() {
        println!(
            "  {:<5} offset={:<4} bytes={:02x?}",
            sig.format(),
            sig.offset_in_window(),
            sig.bytes()
        );
    }
}

/// Human-readable byte count, grounded in `CarvedFile::size_human`'s
/// thresholds.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
