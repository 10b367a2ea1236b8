//! Error types for gql-history.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the fallible layers: storage backends, config, CLI.
///
/// The record and history stores never return these to their callers;
/// they log and degrade instead.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("storage quota exceeded writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("storage write failed: {0}")]
    Storage(String),
}

impl HistoryError {
    /// True when a backend refused a write because it ran out of room.
    pub fn is_quota_error(&self) -> bool {
        matches!(self, HistoryError::QuotaExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
