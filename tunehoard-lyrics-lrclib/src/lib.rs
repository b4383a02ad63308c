use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, info, warn};
use tunehoard_core::{CoreError, LrclibConfig, LyricsQuery, LyricsRecord, LyricsService};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = concat!(
    "Tunehoard/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/tunehoard/tunehoard)"
);

/// LRCLIB.net lyrics lookup
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl LrclibProvider {
    /// Create a client with the configured timeout, retry count and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &LrclibConfig) -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        // Transient failures (5xx, timeouts, resets) are retried with backoff
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_url(&self, query: &LyricsQuery) -> String {
        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        );
        if let Some(ref album) = query.album_name {
            let _ = write!(url, "&album_name={}", urlencoding::encode(album));
        }
        if let Some(duration) = query.duration_secs {
            let _ = write!(url, "&duration={duration}");
        }
        url
    }

    fn search_url(&self, text: &str) -> String {
        format!("{}/search?q={}", self.base_url, urlencoding::encode(text))
    }

    fn failure(&self, reason: String) -> CoreError {
        CoreError::LyricsProviderFailed {
            provider: self.name().to_string(),
            reason,
        }
    }
}

/// Response record from the LRCLIB API
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "trackName")]
    track_name: Option<String>,
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    #[serde(rename = "albumName")]
    album_name: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl From<LrclibResponse> for LyricsRecord {
    fn from(response: LrclibResponse) -> Self {
        // Instrumental tracks have nothing to show
        let (plain_lyrics, synced_lyrics) = if response.instrumental {
            (None, None)
        } else {
            (response.plain_lyrics, response.synced_lyrics)
        };
        Self {
            id: Some(response.id.to_string()),
            track_name: response.track_name,
            artist_name: response.artist_name,
            album_name: response.album_name,
            duration_secs: response.duration,
            plain_lyrics,
            synced_lyrics,
        }
    }
}

#[async_trait]
impl LyricsService for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn get_lyrics(&self, query: &LyricsQuery) -> Result<Option<LyricsRecord>, CoreError> {
        let url = self.get_url(query);
        info!("LRCLIB GET (exact match): {}", url);

        let response = self.client.get(&url).send().await?;
        debug!("LRCLIB response status: {}", response.status());

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!(
                "LRCLIB has no exact match for {} - {}",
                query.artist_name, query.track_name
            );
            return Ok(None);
        }
        if !response.status().is_success() {
            warn!("LRCLIB returned status: {}", response.status());
            return Err(self.failure(format!("LRCLIB returned status: {}", response.status())));
        }

        let result: LrclibResponse = response.json().await?;
        info!("LRCLIB found exact match with id: {}", result.id);
        Ok(Some(result.into()))
    }

    async fn search(&self, query: &str) -> Result<Vec<LyricsRecord>, CoreError> {
        let url = self.search_url(query);
        info!("LRCLIB GET (search): {}", url);

        let response = self.client.get(&url).send().await?;
        debug!("LRCLIB response status: {}", response.status());

        if !response.status().is_success() {
            warn!("LRCLIB search returned status: {}", response.status());
            return Err(self.failure(format!(
                "LRCLIB search returned status: {}",
                response.status()
            )));
        }

        let results: Vec<LrclibResponse> = response.json().await?;
        debug!("LRCLIB search returned {} results", results.len());
        Ok(results.into_iter().map(LyricsRecord::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> LrclibProvider {
        LrclibProvider::new(&LrclibConfig {
            base_url: base_url.to_string(),
            ..LrclibConfig::default()
        })
        .unwrap()
    }

    fn response() -> LrclibResponse {
        LrclibResponse {
            id: 42,
            track_name: Some("Song".into()),
            artist_name: Some("Band".into()),
            album_name: None,
            duration: Some(200.0),
            instrumental: false,
            plain_lyrics: Some("words".into()),
            synced_lyrics: Some("[00:01.00]words".into()),
        }
    }

    #[test]
    fn test_get_url_encodes_all_fields() {
        let provider = provider("https://lrclib.net/api/");
        let query = LyricsQuery::new("Back In Black", "AC/DC")
            .with_album("Back & Forth")
            .with_duration_secs(255);

        assert_eq!(
            provider.get_url(&query),
            "https://lrclib.net/api/get?artist_name=AC%2FDC&track_name=Back%20In%20Black\
             &album_name=Back%20%26%20Forth&duration=255"
        );
    }

    #[test]
    fn test_get_url_omits_missing_fields() {
        let provider = provider("http://localhost:3000");
        let query = LyricsQuery::new("Song", "Band");

        assert_eq!(
            provider.get_url(&query),
            "http://localhost:3000/get?artist_name=Band&track_name=Song"
        );
    }

    #[test]
    fn test_search_url() {
        let provider = provider("https://lrclib.net/api");

        assert_eq!(
            provider.search_url("Song Band"),
            "https://lrclib.net/api/search?q=Song%20Band"
        );
    }

    #[test]
    fn test_response_maps_to_record() {
        let record = LyricsRecord::from(response());

        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.usable_synced(), Some("[00:01.00]words"));
        assert_eq!(record.usable_plain(), Some("words"));
        assert_eq!(record.duration_secs, Some(200.0));
    }

    #[test]
    fn test_instrumental_has_no_lyrics() {
        let record = LyricsRecord::from(LrclibResponse {
            instrumental: true,
            ..response()
        });

        assert!(record.usable_synced().is_none());
        assert!(record.usable_plain().is_none());
    }
}
