mod cli;
mod error;

use crate::cli::{format_bytes, Cli, Command};
use crate::error::AppError;
use async_trait::async_trait;
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tunehoard_core::{
    AcquisitionEngine, BatchReport, BoundedMediaCache, CoreError, DownloadedFile, EngineError,
    LyricsDiskCache, LyricsQuery, LyricsResolver, LyricsResult, Quality, TrackMatch,
    TunehoardConfig,
};
use tunehoard_lyrics_lrclib::LrclibProvider;

fn main() {
    let cli = Cli::parse();

    let config = match TunehoardConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            eprintln!(
                "Created a new config file at {}. Review it and run tunehoard again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!(
                "Failed to load {}: {e}",
                TunehoardConfig::config_path().display()
            );
            std::process::exit(1);
        }
    };

    init_tracing(config.logging.file_enabled);

    match run(&config, cli.command) {
        Ok(()) => {}
        Err(AppError::Interrupted) => std::process::exit(130),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(config: &TunehoardConfig, command: Command) -> Result<(), AppError> {
    let runtime = tokio::runtime::Runtime::new().map_err(AppError::Runtime)?;

    // Ctrl+C cancels whatever command is running
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(async {
        tokio::select! {
            result = execute(config, command) => result,
            () = cancel_token.cancelled() => Err(AppError::Interrupted),
        }
    })
}

async fn execute(config: &TunehoardConfig, command: Command) -> Result<(), AppError> {
    match command {
        Command::Lyrics {
            artist,
            title,
            album,
            duration_secs,
        } => {
            if !config.lyrics.enabled {
                return Err(AppError::LyricsDisabled);
            }
            let mut query = LyricsQuery::new(title, artist);
            if let Some(album) = album.filter(|a| !a.trim().is_empty()) {
                query = query.with_album(album);
            }
            if let Some(duration_secs) = duration_secs {
                query = query.with_duration_secs(duration_secs);
            }

            let resolver = lyrics_resolver(config)?;
            match resolver.resolve(&query).await {
                LyricsResult::Synced(text) | LyricsResult::Unsynced(text) => println!("{text}"),
                LyricsResult::NotFound => {
                    println!(
                        "No lyrics found for {} - {}",
                        query.artist_name, query.track_name
                    );
                }
            }
        }
        Command::CacheSize => {
            let cache = media_cache(config).await?;
            let size = cache.current_size().await?;
            println!(
                "{} of {} used in {}",
                format_bytes(size),
                format_bytes(cache.max_size_bytes()),
                cache.cache_dir().display()
            );
        }
        Command::CacheClear => {
            let cache = media_cache(config).await?;
            let report = cache.clear().await?;
            cache.checkpoint().await?;
            println!(
                "Removed {} file(s), freed {}",
                report.files_removed,
                format_bytes(report.bytes_freed)
            );
        }
        Command::LyricsClear => {
            let cache = LyricsDiskCache::open(&config.lyrics.cache_dir)?;
            let removed = cache.clear().await?;
            println!("Removed {removed} cached lyric(s)");
        }
    }
    Ok(())
}

fn lyrics_resolver(config: &TunehoardConfig) -> Result<LyricsResolver, CoreError> {
    let service = LrclibProvider::new(&config.lyrics.lrclib)?;
    let cache = LyricsDiskCache::open(&config.lyrics.cache_dir)?;
    Ok(LyricsResolver::new(Arc::new(service), cache))
}

async fn media_cache(config: &TunehoardConfig) -> Result<BoundedMediaCache, CoreError> {
    BoundedMediaCache::open(&config.stream_cache, Arc::new(OfflineEngine)).await
}

/// Engine for maintenance commands, which never fetch anything
struct OfflineEngine;

impl OfflineEngine {
    fn unavailable() -> EngineError {
        EngineError::new("No acquisition engine is available in maintenance mode")
    }
}

#[async_trait]
impl AcquisitionEngine for OfflineEngine {
    async fn download_track(
        &self,
        _id: &str,
        _output_dir: &Path,
        _quality: Quality,
    ) -> Result<DownloadedFile, EngineError> {
        Err(Self::unavailable())
    }

    async fn download_album(
        &self,
        _id: &str,
        _output_dir: &Path,
        _quality: Quality,
    ) -> Result<BatchReport, EngineError> {
        Err(Self::unavailable())
    }

    async fn download_playlist(
        &self,
        _id: &str,
        _output_dir: &Path,
        _quality: Quality,
    ) -> Result<BatchReport, EngineError> {
        Err(Self::unavailable())
    }

    async fn search_tracks(&self, _query: &str) -> Result<Vec<TrackMatch>, EngineError> {
        Err(Self::unavailable())
    }
}

fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = tunehoard_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
