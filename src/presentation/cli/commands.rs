//! CLI commands using clap
//!
//! Adapted from the teacher's `Cli`/`Commands` to the carve/exfat-list/
//! exfat-extract/list-signatures surface spec section 6 names, with the
//! same exit-code contract (0 success, 1 I/O error, 2 invalid source,
//! 3 user cancel) left to `main` to enforce.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Argos - a signature-driven file carver with an exFAT walker.
#[derive(Parser)]
#[command(name = "argos-carver")]
#[command(version = "0.1.0")]
#[command(about = "Carve files by signature, or walk an exFAT volume's own metadata", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Carve recoverable files out of a device or image by signature
    Carve {
        /// Path to device or image file (e.g., /dev/sda, disk.img)
        #[arg(short, long)]
        source: String,

        /// Output directory for carved artifacts
        #[arg(short, long, default_value = "./carved")]
        out: PathBuf,

        /// Restrict carving to these extensions (gif, png, mng, jng, mpg, icc, psb)
        #[arg(long, value_delimiter = ',')]
        with: Option<Vec<String>>,

        /// Ring buffer window size in MB
        #[arg(long, default_value = "4")]
        window_mb: usize,
    },

    /// List entries in an exFAT volume's root directory
    ExfatList {
        /// Path to device or image file containing an exFAT volume
        #[arg(short, long)]
        source: String,

        /// Include deleted-but-unwiped directory entries
        #[arg(long)]
        include_deleted: bool,
    },

    /// Extract every entry in an exFAT volume's root directory
    ExfatExtract {
        /// Path to device or image file containing an exFAT volume
        #[arg(short, long)]
        source: String,

        /// Output directory for extracted files
        #[arg(short, long, default_value = "./extracted")]
        out: PathBuf,

        /// Include deleted-but-unwiped directory entries
        #[arg(long)]
        include_deleted: bool,
    },

    /// List the signatures the registry recognizes
    ListSignatures,
}

/// Parses extension strings into `FormatId`s, per `--with <ext,…>`.
pub fn parse_formats(exts: Option<Vec<String>>) -> Vec<crate::domain::entities::FormatId> {
    use crate::domain::entities::FormatId;

    match exts {
        None => vec![],
        Some(exts) => exts
            .iter()
            .filter_map(|s| match s.to_lowercase().as_str() {
                "gif" => Some(FormatId::Gif),
                "png" => Some(FormatId::Png),
                "mng" => Some(FormatId::Mng),
                "jng" => Some(FormatId::Jng),
                "mpg" | "mpeg" => Some(FormatId::Mpeg),
                "icc" => Some(FormatId::Icc),
                "psb" => Some(FormatId::Psb),
                _ => {
                    eprintln!("Warning: Unknown format '{}'", s);
                    None
                }
            })
            .collect(),
    }
}
