pub mod cache_index;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod lyrics;
pub mod lyrics_cache;
pub mod media_cache;
pub mod paths;
pub mod provider;
pub mod single_flight;
pub mod time;

pub use cache_index::{CacheIndex, CacheIndexEntry};
pub use config::{
    DownloadsConfig, LoggingConfig, LrclibConfig, LyricsConfig, StreamCacheConfig,
    TunehoardConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use download::{
    AcquisitionState, CompletionCallback, DownloadCoordinator, DownloadRequest,
    GENERIC_FAILURE_MESSAGE,
};
pub use engine::{
    AcquisitionEngine, BatchItemIssue, BatchReport, ContentKind, DownloadedFile, LibraryScanner,
    NoopScanner, Quality, TrackMatch,
};
pub use error::{CoreError, EngineError, Result};
pub use lyrics::{LyricsResolver, FUZZY_SYNCED_SCAN_LIMIT};
pub use lyrics_cache::{cache_key, LyricsDiskCache, LEGACY_NOT_FOUND_SENTINEL};
pub use media_cache::{BoundedMediaCache, CacheClearReport, EvictionReport};
pub use paths::{
    config_dir, lyrics_cache_dir, stream_cache_dir, stream_cache_index_path, CONFIG_DIR_NAME,
    CONFIG_FILE_NAME, STREAM_CACHE_INDEX_FILE_NAME,
};
pub use provider::{LyricsQuery, LyricsRecord, LyricsResult, LyricsService};
pub use single_flight::{SingleFlightGuard, SingleFlightLock};
pub use time::DurationExt;
