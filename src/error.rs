use thiserror::Error;

use crate::fetch::FetchError;
use crate::tts::TtsError;

/// Typed application error hierarchy for all CLI commands.
///
/// Module-level errors (`FetchError`, `TtsError`) stay typed so retry policy
/// can match on variants; everything converges here for reporting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Tts(#[from] TtsError),

    #[error("audio assembly failed: {0}")]
    Audio(String),

    #[error("feed rendering failed: {0}")]
    Feed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

// ── From impls ─────────────────────────────────────────────────────────────

impl From<rss::Error> for AppError {
    fn from(e: rss::Error) -> Self {
        AppError::Feed(e.to_string())
    }
}

/// Allows `.map_err(|e| format!("…", e))?` and `ok_or_else(|| format!(…))?`
/// to coerce into AppError without changing the call sites.
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

/// Allows `.ok_or("literal string")?` to coerce into AppError.
impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Other(s.to_string())
    }
}
