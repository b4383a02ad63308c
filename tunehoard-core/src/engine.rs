//! Contract of the external acquisition engine and the library rescan hook.
//!
//! The engine owns authentication, decryption and raw file transfer. This
//! crate only orchestrates it: every call may fail with an opaque
//! [`EngineError`] whose message is surfaced verbatim.

use crate::error::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Audio quality requested from the acquisition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    #[default]
    High,
    Lossless,
}

impl Quality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::Lossless => "lossless",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content an acquisition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Track,
    Album,
    Playlist,
}

impl ContentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the engine wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
}

impl DownloadedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// An item of a batch that did not end up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemIssue {
    pub id: String,
    pub title: Option<String>,
    pub reason: String,
}

/// Per-item outcome of an album or playlist download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub successful: Vec<DownloadedFile>,
    pub failed: Vec<BatchItemIssue>,
    /// Items the engine chose not to fetch (e.g. already present)
    pub skipped: Vec<BatchItemIssue>,
}

/// A catalog search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMatch {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<u32>,
}

/// External service that materializes remote content on disk.
#[async_trait]
pub trait AcquisitionEngine: Send + Sync {
    /// Download a single track into `output_dir`.
    async fn download_track(
        &self,
        id: &str,
        output_dir: &Path,
        quality: Quality,
    ) -> Result<DownloadedFile, EngineError>;

    /// Download every track of an album into `output_dir`.
    async fn download_album(
        &self,
        id: &str,
        output_dir: &Path,
        quality: Quality,
    ) -> Result<BatchReport, EngineError>;

    /// Download every track of a playlist into `output_dir`.
    async fn download_playlist(
        &self,
        id: &str,
        output_dir: &Path,
        quality: Quality,
    ) -> Result<BatchReport, EngineError>;

    /// Search the remote catalog.
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackMatch>, EngineError>;
}

/// Media index refresh primitive (e.g. a platform media scanner).
///
/// Called once per written file so it becomes visible to file-aware
/// consumers without waiting for a full library scan.
#[async_trait]
pub trait LibraryScanner: Send + Sync {
    async fn scan_file(&self, path: &Path) -> std::io::Result<()>;
}

/// Scanner that does nothing, for hosts without a media index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScanner;

#[async_trait]
impl LibraryScanner for NoopScanner {
    async fn scan_file(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}
