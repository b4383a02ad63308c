//! Lyrics resolver: cache-aside lookups with ordered fallback strategies.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::lyrics_cache::LyricsDiskCache;
use crate::provider::{LyricsQuery, LyricsRecord, LyricsResult, LyricsService};

/// How many fuzzy search results are scanned for synced lyrics
pub const FUZZY_SYNCED_SCAN_LIMIT: usize = 5;

/// Resolves the best lyrics for a local track, preferring synced text.
///
/// Order: disk cache, exact match (synced), fuzzy search (synced, first
/// five results), then plain text from the exact match or any search
/// result. Service errors never escape; only positive results are cached.
pub struct LyricsResolver {
    service: Arc<dyn LyricsService>,
    cache: LyricsDiskCache,
}

impl LyricsResolver {
    pub fn new(service: Arc<dyn LyricsService>, cache: LyricsDiskCache) -> Self {
        Self { service, cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &LyricsDiskCache {
        &self.cache
    }

    /// Resolve lyrics for a track
    pub async fn resolve(&self, query: &LyricsQuery) -> LyricsResult {
        let artist = query.artist_name.as_str();
        let title = query.track_name.as_str();

        match self.cache.get(artist, title).await {
            Ok(Some(cached)) => {
                info!("Using cached lyrics for {} - {}", artist, title);
                return LyricsResult::from_stored(cached);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read lyrics cache for {} - {}: {}", artist, title, e),
        }

        info!(
            "Resolving lyrics for {} - {} via {}",
            artist,
            title,
            self.service.name()
        );

        let exact = match self.service.get_lyrics(query).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Exact lyrics lookup failed: {}", e);
                None
            }
        };

        if let Some(synced) = exact.as_ref().and_then(LyricsRecord::usable_synced) {
            info!("Found synced lyrics by exact match");
            return self.store(query, LyricsResult::Synced(synced.to_string())).await;
        }

        let search_text = query.search_text();
        let candidates = match self.service.search(&search_text).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Lyrics search for {:?} failed: {}", search_text, e);
                Vec::new()
            }
        };
        debug!("Lyrics search returned {} candidates", candidates.len());

        if let Some(synced) = candidates
            .iter()
            .take(FUZZY_SYNCED_SCAN_LIMIT)
            .find_map(LyricsRecord::usable_synced)
        {
            info!("Found synced lyrics by search");
            return self.store(query, LyricsResult::Synced(synced.to_string())).await;
        }

        let plain = exact
            .as_ref()
            .and_then(LyricsRecord::usable_plain)
            .or_else(|| candidates.iter().find_map(LyricsRecord::usable_plain));
        if let Some(plain) = plain {
            info!("Falling back to plain lyrics");
            return self.store(query, LyricsResult::Unsynced(plain.to_string())).await;
        }

        info!("No lyrics found for {} - {}", artist, title);
        LyricsResult::NotFound
    }

    /// Drop the cached entry for one track so the next resolve hits the network
    pub async fn invalidate(&self, artist: &str, title: &str) -> bool {
        match self.cache.remove(artist, title).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to invalidate lyrics for {} - {}: {}", artist, title, e);
                false
            }
        }
    }

    /// Drop every cached entry, returning how many were removed
    pub async fn clear_cache(&self) -> usize {
        match self.cache.clear().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to clear lyrics cache: {}", e);
                0
            }
        }
    }

    async fn store(&self, query: &LyricsQuery, result: LyricsResult) -> LyricsResult {
        if let Some(text) = result.text() {
            if let Err(e) = self
                .cache
                .put(&query.artist_name, &query.track_name, text)
                .await
            {
                warn!("Failed to cache lyrics: {}", e);
            }
        }
        result
    }
}
