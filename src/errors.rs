//! Error types for quakemap.
//!
//! Uses `thiserror` for library-style error definitions.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while ingesting a feed or handling user input.
#[derive(Error, Debug)]
pub enum QuakeError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed returned a non-success status
    #[error("USGS feed error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Retrieval did not finish in time
    #[error("feed request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// JSON parsing failed
    #[error("Failed to parse feed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed document has the wrong shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Time window name outside the enumerated set
    #[error("unknown time window: {0} (expected: day, week, month)")]
    UnknownWindow(String),
}

/// Coarse classification of a [`QuakeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, timeout or non-success status
    Network,
    /// Malformed or unexpected document
    Parse,
    /// Rejected user input
    Validation,
}

impl QuakeError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Api { .. } | Self::Timeout(_) => ErrorKind::Network,
            Self::Parse(_) | Self::InvalidResponse(_) => ErrorKind::Parse,
            Self::UnknownWindow(_) => ErrorKind::Validation,
        }
    }
}
