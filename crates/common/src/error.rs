//! Error types for the ThesisTrack test harness

use thiserror::Error;

/// Result type alias using the harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No token available for role: {0}")]
    MissingToken(String),

    #[error("Response body missing field: {0}")]
    MissingField(String),

    #[error("Seed data setup failed: {0}")]
    Setup(String),

    #[error("Run interrupted")]
    Interrupted,
}
