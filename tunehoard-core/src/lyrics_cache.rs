//! Plain-text lyrics cache, one file per normalized `(artist, title)` pair.
//!
//! Only positive results are ever written. A missing file means "not yet
//! resolved"; blank files and the `NOT_FOUND` sentinel written by older
//! versions are deleted on read so the track gets looked up again.

use crate::error::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Negative-result marker stored by earlier releases
pub const LEGACY_NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

const ENTRY_EXTENSION: &str = "txt";

/// Directory of cached lyric texts
#[derive(Debug, Clone)]
pub struct LyricsDiskCache {
    dir: PathBuf,
}

impl LyricsDiskCache {
    /// Use `dir` as the cache directory, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!("Lyrics cache at {:?}", dir);
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the `(artist, title)` entry
    #[must_use]
    pub fn entry_path(&self, artist: &str, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", cache_key(artist, title)))
    }

    /// Read a valid entry. Invalid entries are deleted and read as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn get(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let path = self.entry_path(artist, title);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if is_valid_entry(&content) {
            debug!("Lyrics cache hit: {:?}", path);
            return Ok(Some(content));
        }

        info!("Discarding invalid lyrics cache entry {:?}", path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to delete invalid lyrics cache entry {:?}: {}", path, e);
        }
        Ok(None)
    }

    /// Store resolved lyrics. Blank text is refused and never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn put(&self, artist: &str, title: &str, lyrics: &str) -> Result<bool> {
        if !is_valid_entry(lyrics) {
            return Ok(false);
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(artist, title);
        tokio::fs::write(&path, lyrics).await?;
        debug!("Stored lyrics at {:?}", path);
        Ok(true)
    }

    /// Delete one entry, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub async fn remove(&self, artist: &str, title: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.entry_path(artist, title)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every entry, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to delete lyrics cache entry {:?}: {}", path, e),
            }
        }
        Ok(removed)
    }
}

/// `artist_title`, lowercased, with everything but letters and digits
/// (in any script) replaced by `_`
#[must_use]
pub fn cache_key(artist: &str, title: &str) -> String {
    format!("{}_{}", sanitize(artist), sanitize(title))
}

fn sanitize(part: &str) -> String {
    let mut sanitized = String::with_capacity(part.len());
    for c in part.trim().chars() {
        if c.is_alphanumeric() {
            sanitized.extend(c.to_lowercase());
        } else {
            sanitized.push('_');
        }
    }
    sanitized
}

fn is_valid_entry(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && trimmed != LEGACY_NOT_FOUND_SENTINEL
}
