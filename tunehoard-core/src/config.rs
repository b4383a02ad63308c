use crate::engine::Quality;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunehoardConfig {
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub stream_cache: StreamCacheConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persistent (user-visible) downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    #[serde(default = "crate::paths::downloads_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub default_quality: Quality,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            output_dir: crate::paths::downloads_dir(),
            default_quality: Quality::default(),
        }
    }
}

/// Ephemeral playback cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamCacheConfig {
    #[serde(default = "crate::paths::stream_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "crate::paths::stream_cache_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    #[serde(default = "default_stream_quality")]
    pub quality: Quality,
}

/// 512 MiB
const fn default_max_size_bytes() -> u64 {
    512 * 1024 * 1024
}

const fn default_stream_quality() -> Quality {
    Quality::High
}

impl Default for StreamCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: crate::paths::stream_cache_dir(),
            index_path: crate::paths::stream_cache_index_path(),
            max_size_bytes: default_max_size_bytes(),
            quality: default_stream_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "crate::paths::lyrics_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub lrclib: LrclibConfig,
}

const fn default_true() -> bool {
    true
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: crate::paths::lyrics_cache_dir(),
            lrclib: LrclibConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrclibConfig {
    #[serde(default = "default_lrclib_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_lrclib_base_url() -> String {
    "https://lrclib.net/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for LrclibConfig {
    fn default() -> Self {
        Self {
            base_url: default_lrclib_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `~/.cache/tunehoard/tunehoard.log`
    #[serde(default)]
    pub file_enabled: bool,
}

impl TunehoardConfig {
    /// Get the config file path (~/.config/tunehoard/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path` or create a template there
    ///
    /// # Errors
    ///
    /// Same as [`TunehoardConfig::load_or_create`].
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns an error on TOML syntax errors or invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.stream_cache.max_size_bytes == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "stream_cache.max_size_bytes must be greater than 0".to_string(),
            });
        }
        if self
            .stream_cache
            .index_path
            .starts_with(&self.stream_cache.cache_dir)
        {
            return Err(CoreError::ConfigInvalid {
                message: "stream_cache.index_path must not be inside stream_cache.cache_dir"
                    .to_string(),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# Tunehoard Configuration
# ~/.config/tunehoard/config.toml
# Every value is optional; the defaults are shown commented out.

[downloads]
# Where persistent track/album/playlist downloads are written
# output_dir = "~/Music/Tunehoard"
# Quality: "low", "high", "lossless"
default_quality = "high"

[stream_cache]
# Transient playback cache, evicted least-recently-used first
# cache_dir = "~/.cache/tunehoard/stream_cache"
# index_path = "~/.config/tunehoard/stream_cache_index.db"
max_size_bytes = 536870912  # 512 MiB
quality = "high"

[lyrics]
enabled = true
# cache_dir = "~/.cache/tunehoard/lyrics"

[lyrics.lrclib]
base_url = "https://lrclib.net/api"
timeout_secs = 10
max_retries = 3

[logging]
# Also write logs to ~/.cache/tunehoard/tunehoard.log
file_enabled = false
"#;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_parses_with_defaults() {
        let config = TunehoardConfig::parse(CONFIG_TEMPLATE).expect("template should parse");
        assert_eq!(config.downloads.default_quality, Quality::High);
        assert_eq!(config.stream_cache.max_size_bytes, 512 * 1024 * 1024);
        assert!(config.lyrics.enabled);
        assert_eq!(config.lyrics.lrclib.max_retries, 3);
        assert!(!config.logging.file_enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TunehoardConfig::parse("").expect("empty config should parse");
        assert_eq!(config.lyrics.lrclib.base_url, "https://lrclib.net/api");
        assert_eq!(config.stream_cache.quality, Quality::High);
    }

    #[test]
    fn test_zero_cache_size_is_rejected() {
        let result = TunehoardConfig::parse("[stream_cache]\nmax_size_bytes = 0\n");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_index_inside_cache_dir_is_rejected() {
        let result = TunehoardConfig::parse(
            "[stream_cache]\ncache_dir = \"/tmp/th\"\nindex_path = \"/tmp/th/index.db\"\n",
        );
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let result = TunehoardConfig::parse("[downloads\n");
        assert!(matches!(result, Err(CoreError::ConfigParseError(_))));
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let first = TunehoardConfig::load_or_create_at(&path);
        assert!(matches!(first, Err(CoreError::ConfigNotFound { .. })));
        assert!(path.exists());

        let second = TunehoardConfig::load_or_create_at(&path).expect("template should load");
        assert!(second.lyrics.enabled);
    }
}
