//! Single-flight coordinator for persistent downloads.
//!
//! One acquisition runs at a time. Requests made while the slot is taken are
//! rejected on the spot. Accepted work runs on a task tracker owned by the
//! coordinator, so it finishes even when the requesting screen goes away,
//! and its progress is published through one watch channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::engine::{
    AcquisitionEngine, BatchReport, ContentKind, LibraryScanner, Quality, TrackMatch,
};
use crate::error::EngineError;
use crate::single_flight::{SingleFlightGuard, SingleFlightLock};

/// Message used when a failure carries no text of its own
pub const GENERIC_FAILURE_MESSAGE: &str = "Download failed";

/// The one authoritative acquisition state. Replaced wholesale on every
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AcquisitionState {
    /// Nothing running
    #[default]
    Idle,
    InProgress {
        content_kind: ContentKind,
        title: String,
        content_id: String,
    },
    /// Finished, possibly with per-item failures for albums and playlists
    Completed {
        content_kind: ContentKind,
        title: String,
        success_count: usize,
        failed_count: usize,
        skipped_count: usize,
    },
    Failed {
        title: String,
        message: String,
    },
}

impl AcquisitionState {
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    /// `Completed` or `Failed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// What to download and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub content_kind: ContentKind,
    pub content_id: String,
    pub title: String,
    pub quality: Quality,
    pub output_dir: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        content_kind: ContentKind,
        content_id: impl Into<String>,
        title: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content_kind,
            content_id: content_id.into(),
            title: title.into(),
            quality: Quality::default(),
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub const fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// Invoked once with the terminal state of an accepted request
pub type CompletionCallback = Box<dyn FnOnce(&AcquisitionState) + Send + 'static>;

pub struct DownloadCoordinator {
    engine: Arc<dyn AcquisitionEngine>,
    scanner: Arc<dyn LibraryScanner>,
    lock: Arc<SingleFlightLock>,
    state_tx: Arc<watch::Sender<AcquisitionState>>,
    tasks: TaskTracker,
}

impl DownloadCoordinator {
    pub fn new(engine: Arc<dyn AcquisitionEngine>, scanner: Arc<dyn LibraryScanner>) -> Self {
        let (state_tx, _) = watch::channel(AcquisitionState::Idle);
        Self {
            engine,
            scanner,
            lock: SingleFlightLock::new(),
            state_tx: Arc::new(state_tx),
            tasks: TaskTracker::new(),
        }
    }

    /// Start a download unless one is already running.
    ///
    /// Returns `false` immediately, without touching the state, when the
    /// slot is taken. Otherwise publishes `InProgress`, spawns the transfer
    /// and returns `true` without waiting for it. Must be called from within
    /// a Tokio runtime.
    pub fn request_download(
        &self,
        request: DownloadRequest,
        on_complete: Option<CompletionCallback>,
    ) -> bool {
        let Some(guard) = self.lock.try_acquire() else {
            debug!(
                "Rejecting download of {} {:?}: another download is running",
                request.content_kind, request.title
            );
            return false;
        };

        info!(
            "Starting {} download: {} ({}, quality: {})",
            request.content_kind, request.title, request.content_id, request.quality
        );
        self.state_tx.send_replace(AcquisitionState::InProgress {
            content_kind: request.content_kind,
            title: request.title.clone(),
            content_id: request.content_id.clone(),
        });

        let engine = Arc::clone(&self.engine);
        let scanner = Arc::clone(&self.scanner);
        let state_tx = Arc::clone(&self.state_tx);
        self.tasks.spawn(async move {
            let title = request.title.clone();
            // Inner task so a panicking engine still ends in a terminal state
            let worker = tokio::spawn(async move {
                run_acquisition(engine.as_ref(), scanner.as_ref(), &request).await
            });
            let terminal = match worker.await {
                Ok(state) => state,
                Err(e) => {
                    error!("Download task for {} aborted: {}", title, e);
                    AcquisitionState::Failed {
                        title,
                        message: GENERIC_FAILURE_MESSAGE.to_string(),
                    }
                }
            };
            publish_and_release(&state_tx, terminal.clone(), guard);
            if let Some(on_complete) = on_complete {
                on_complete(&terminal);
            }
        });

        true
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        self.state_tx.borrow().clone()
    }

    /// Listen to state transitions; the receiver always holds the latest value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionState> {
        self.state_tx.subscribe()
    }

    /// Whether a download is currently reported as running
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state_tx.borrow().is_in_progress()
    }

    /// Go back to `Idle` after a terminal state has been shown.
    ///
    /// Does not stop a running task or release the slot.
    pub fn reset_state(&self) {
        self.state_tx.send_replace(AcquisitionState::Idle);
    }

    /// Search the remote catalog; engine failures yield no matches
    pub async fn search_tracks(&self, query: &str) -> Vec<TrackMatch> {
        match self.engine.search_tracks(query).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Catalog search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Wait for the running download, if any, to finish
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

/// Publish the terminal state and free the slot in one step, so a listener
/// that sees the terminal state can immediately start the next download.
fn publish_and_release(
    state_tx: &watch::Sender<AcquisitionState>,
    terminal: AcquisitionState,
    guard: SingleFlightGuard,
) {
    state_tx.send_modify(move |state| {
        *state = terminal;
        drop(guard);
    });
}

async fn run_acquisition(
    engine: &dyn AcquisitionEngine,
    scanner: &dyn LibraryScanner,
    request: &DownloadRequest,
) -> AcquisitionState {
    let outcome = match fetch(engine, request).await {
        Ok(report) => report,
        Err(e) => {
            let message = failure_message(&e);
            warn!("Download of {} failed: {}", request.title, message);
            return AcquisitionState::Failed {
                title: request.title.clone(),
                message,
            };
        }
    };

    for file in &outcome.successful {
        rescan(scanner, &file.path).await;
    }

    info!(
        "Finished {} download {}: {} ok, {} failed, {} skipped",
        request.content_kind,
        request.title,
        outcome.successful.len(),
        outcome.failed.len(),
        outcome.skipped.len()
    );
    AcquisitionState::Completed {
        content_kind: request.content_kind,
        title: request.title.clone(),
        success_count: outcome.successful.len(),
        failed_count: outcome.failed.len(),
        skipped_count: outcome.skipped.len(),
    }
}

async fn fetch(
    engine: &dyn AcquisitionEngine,
    request: &DownloadRequest,
) -> Result<BatchReport, EngineError> {
    tokio::fs::create_dir_all(&request.output_dir)
        .await
        .map_err(|e| EngineError::new(format!("Cannot create {:?}: {e}", request.output_dir)))?;

    let id = request.content_id.as_str();
    let dir = request.output_dir.as_path();
    match request.content_kind {
        ContentKind::Track => {
            let file = engine.download_track(id, dir, request.quality).await?;
            Ok(BatchReport {
                successful: vec![file],
                ..BatchReport::default()
            })
        }
        ContentKind::Album => engine.download_album(id, dir, request.quality).await,
        ContentKind::Playlist => engine.download_playlist(id, dir, request.quality).await,
    }
}

fn failure_message(error: &EngineError) -> String {
    let message = error.message().trim();
    if message.is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

async fn rescan(scanner: &dyn LibraryScanner, path: &Path) {
    if let Err(e) = scanner.scan_file(path).await {
        warn!("Library rescan of {:?} failed: {}", path, e);
    }
}
