//! Error types for tsundoku-insights

use thiserror::Error;

/// Main error type for the tsundoku-insights library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Analyzer not found in the engine registry
    #[error("analyzer not found: {0}")]
    AnalyzerNotFound(String),
}

/// Result type alias for tsundoku-insights
pub type Result<T> = std::result::Result<T, Error>;
