// src/error.rs
// Standardized error types for continuum

use thiserror::Error;

/// Main error type for the continuum library
#[derive(Error, Debug)]
pub enum ContinuumError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Session already active. End current session first.")]
    SessionAlreadyActive,

    #[error("No active session")]
    NoActiveSession,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Result using ContinuumError
pub type Result<T> = std::result::Result<T, ContinuumError>;

impl ContinuumError {
    /// Build the error reported when a required tool argument is absent or empty
    pub fn missing(arg: &str) -> Self {
        ContinuumError::InvalidInput(format!("{} is required", arg))
    }
}

impl From<ContinuumError> for String {
    fn from(err: ContinuumError) -> Self {
        err.to_string()
    }
}
