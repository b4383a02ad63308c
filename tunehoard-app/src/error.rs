use thiserror::Error;
use tunehoard_core::CoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to create tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Lyrics are disabled in the config ([lyrics] enabled = false)")]
    LyricsDisabled,

    #[error("Interrupted")]
    Interrupted,
}
