//! Command line interface of the maintenance binary.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tunehoard")]
#[command(about = "Maintenance commands for the Tunehoard offline media layer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resolve lyrics for a track, using the lyrics cache first
    Lyrics {
        artist: String,
        title: String,
        album: Option<String>,
        /// Track length, used to pick the right recording
        duration_secs: Option<u32>,
    },
    /// Show how much of the stream cache ceiling is used
    CacheSize,
    /// Delete every cached stream
    CacheClear,
    /// Delete every cached lyric
    LyricsClear,
}

/// `1536` -> `1.5 KiB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
