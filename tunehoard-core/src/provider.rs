use crate::error::CoreError;
use crate::time::DurationExt;
use async_trait::async_trait;
use std::time::Duration;

/// Query parameters for an exact lyrics lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Album name (optional)
    pub album_name: Option<String>,
    /// Track duration in seconds (for matching)
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: None,
            duration_secs: None,
        }
    }

    /// Set album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = Some(album.into());
        self
    }

    /// Set duration in whole seconds
    #[must_use]
    pub const fn with_duration_secs(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    /// Set duration from a track length
    #[must_use]
    pub fn with_duration(self, duration: Duration) -> Self {
        self.with_duration_secs(duration.as_secs_u32())
    }

    /// Free-text query used by the fuzzy search strategy
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {}", self.track_name, self.artist_name)
    }
}

/// A lyrics record as returned by the lookup service.
///
/// Transient: only the chosen text is ever persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsRecord {
    /// Service-specific record ID
    pub id: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration_secs: Option<f64>,
    pub plain_lyrics: Option<String>,
    /// Line-timed text using the `[mm:ss.xx]text` convention
    pub synced_lyrics: Option<String>,
}

impl LyricsRecord {
    /// Synced lyrics, if present and not blank
    #[must_use]
    pub fn usable_synced(&self) -> Option<&str> {
        non_blank(self.synced_lyrics.as_deref())
    }

    /// Plain lyrics, if present and not blank
    #[must_use]
    pub fn usable_plain(&self) -> Option<&str> {
        non_blank(self.plain_lyrics.as_deref())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Outcome of a lyrics resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsResult {
    /// Synchronized lyrics with `[mm:ss.xx]` line timing
    Synced(String),
    /// Plain text lyrics without timing
    Unsynced(String),
    /// No lyrics found
    NotFound,
}

impl LyricsResult {
    /// Classify stored text by looking for a leading LRC timestamp
    #[must_use]
    pub fn from_stored(text: String) -> Self {
        if looks_synced(&text) {
            Self::Synced(text)
        } else {
            Self::Unsynced(text)
        }
    }

    /// Check if lyrics were found
    #[must_use]
    pub const fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Check if lyrics are synced
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    /// Get text content regardless of type
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Synced(text) | Self::Unsynced(text) => Some(text),
            Self::NotFound => None,
        }
    }
}

/// True when the first non-empty line after any `[ar:...]`-style metadata
/// tags starts with `[mm:ss`
fn looks_synced(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find(|l| !is_metadata_tag(l))
        .is_some_and(is_timestamped)
}

/// `[mm:ss...]text`
fn is_timestamped(line: &str) -> bool {
    let Some((minutes, rest)) = tag_parts(line) else {
        return false;
    };
    let seconds: String = rest.chars().take_while(char::is_ascii_digit).collect();
    !minutes.is_empty() && minutes.chars().all(|c| c.is_ascii_digit()) && seconds.len() == 2
}

/// `[ar:Artist]`, `[ti:Title]`, `[offset:+100]` and similar header lines
fn is_metadata_tag(line: &str) -> bool {
    tag_parts(line).is_some_and(|(key, _)| {
        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic())
    })
}

/// Split `[key:rest` into `key` and `rest`
fn tag_parts(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix('[')?.split_once(':')
}

/// Remote lyrics lookup service
#[async_trait]
pub trait LyricsService: Send + Sync {
    /// Get the service name
    fn name(&self) -> &'static str;

    /// Exact lookup by track, artist and optional album/duration
    async fn get_lyrics(&self, query: &LyricsQuery) -> Result<Option<LyricsRecord>, CoreError>;

    /// Free-text search
    async fn search(&self, query: &str) -> Result<Vec<LyricsRecord>, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_is_title_then_artist() {
        let query = LyricsQuery::new("Song", "Band");
        assert_eq!(query.search_text(), "Song Band");
    }

    #[test]
    fn test_with_duration_truncates_to_seconds() {
        let query = LyricsQuery::new("Song", "Band").with_duration(Duration::from_millis(215_900));
        assert_eq!(query.duration_secs, Some(215));
    }

    #[test]
    fn test_usable_fields_skip_blank_text() {
        let record = LyricsRecord {
            plain_lyrics: Some("  \n ".to_string()),
            synced_lyrics: Some("[00:01.00]la".to_string()),
            ..Default::default()
        };
        assert_eq!(record.usable_plain(), None);
        assert_eq!(record.usable_synced(), Some("[00:01.00]la"));
    }

    #[test]
    fn test_from_stored_detects_timestamps() {
        assert!(LyricsResult::from_stored("[00:12.34]Hello\n[00:15.00]World".into()).is_synced());
        assert!(LyricsResult::from_stored("\n[01:02.03]Late start".into()).is_synced());
        assert!(!LyricsResult::from_stored("[Chorus]\nHello".into()).is_synced());
        assert!(!LyricsResult::from_stored("Just words".into()).is_synced());
    }

    #[test]
    fn test_from_stored_skips_metadata_header() {
        let lrc = "[ar:Band]\n[ti:Song]\n[offset:+250]\n[00:12.34]Hello";
        assert!(LyricsResult::from_stored(lrc.into()).is_synced());
        assert!(!LyricsResult::from_stored("[ar:Band]\n[ti:Song]\nHello".into()).is_synced());
        assert!(!LyricsResult::from_stored("[ar:Band]".into()).is_synced());
    }

    #[test]
    fn test_not_found_has_no_text() {
        assert!(!LyricsResult::NotFound.is_found());
        assert_eq!(LyricsResult::NotFound.text(), None);
        assert_eq!(LyricsResult::Unsynced("x".into()).text(), Some("x"));
    }
}
