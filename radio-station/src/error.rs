//! Error types for radio-station
//!
//! Most failure paths inside the clock resolve to a state transition rather
//! than an error; these variants cover startup and the request layer.

use thiserror::Error;

/// Main error type for radio-station
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from radio-common
    #[error(transparent)]
    Common(#[from] radio_common::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Track record could not be parsed
    #[error("Invalid track record: {0}")]
    InvalidTrack(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using radio-station Error
pub type Result<T> = std::result::Result<T, Error>;
