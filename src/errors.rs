//! Error types for tidecast.
//!
//! Uses `thiserror` for library-style error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in tidecast operations.
#[derive(Error, Debug)]
pub enum TideError {
    /// Reading a prediction file failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// NOAA returned an error status
    #[error("NOAA API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Downloaded body was not a usable prediction export
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Date argument was not a valid YYYY-MM-DD date
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Station key is not registered
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// Station spec or other user input failed validation
    #[error("invalid input: {0}")]
    Validation(String),
}
