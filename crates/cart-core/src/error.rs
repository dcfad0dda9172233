//! Error Types

use thiserror::Error;

/// Result type alias for cart persistence operations
pub type Result<T> = std::result::Result<T, CartError>;

/// Durable storage errors.
///
/// These never reach the user: the store logs them and carries on with
/// memory-only state.
#[derive(Error, Debug)]
pub enum CartError {
    /// Backend-specific storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart record could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CartError {
    /// Short diagnostic code for structured logs
    pub fn code(&self) -> &'static str {
        match self {
            CartError::Storage(_) => "STORAGE_ERROR",
            CartError::Io(_) => "STORAGE_IO",
            CartError::Json(_) => "STORAGE_CORRUPT",
        }
    }
}
