//! Path constants for configuration, cache and download locations.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "tunehoard";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the stream cache index database file
pub const STREAM_CACHE_INDEX_FILE_NAME: &str = "stream_cache_index.db";

/// The name of the stream cache directory
pub const STREAM_CACHE_DIR_NAME: &str = "stream_cache";

/// The name of the lyrics cache directory
pub const LYRICS_CACHE_DIR_NAME: &str = "lyrics";

/// The name of the persistent downloads directory under the user's music folder
pub const DOWNLOADS_DIR_NAME: &str = "Tunehoard";

/// The name of the log file
pub const LOG_FILE_NAME: &str = "tunehoard.log";

/// Get the configuration directory path (~/.config/tunehoard/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/tunehoard/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the platform cache directory for tunehoard (e.g. `~/.cache/tunehoard/`)
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| config_dir().join("cache"))
        .join(CONFIG_DIR_NAME)
}

/// Get the default stream cache directory (`~/.cache/tunehoard/stream_cache/`)
#[must_use]
pub fn stream_cache_dir() -> PathBuf {
    cache_dir().join(STREAM_CACHE_DIR_NAME)
}

/// Get the default stream cache index path (`~/.config/tunehoard/stream_cache_index.db`)
///
/// Lives outside the stream cache directory so eviction never sees it.
#[must_use]
pub fn stream_cache_index_path() -> PathBuf {
    config_dir().join(STREAM_CACHE_INDEX_FILE_NAME)
}

/// Get the default lyrics cache directory (`~/.cache/tunehoard/lyrics/`)
#[must_use]
pub fn lyrics_cache_dir() -> PathBuf {
    cache_dir().join(LYRICS_CACHE_DIR_NAME)
}

/// Get the default persistent downloads directory (`~/Music/Tunehoard/`)
#[must_use]
pub fn downloads_dir() -> PathBuf {
    dirs::audio_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Music")
        })
        .join(DOWNLOADS_DIR_NAME)
}

/// Get the log file path (`~/.cache/tunehoard/tunehoard.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    cache_dir().join(LOG_FILE_NAME)
}
