//! Failure taxonomy for weather lookups.
//!
//! The `Display` output of every variant is the message shown to the user.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("City not found")]
    NotFound,

    #[error("Too many requests")]
    RateLimited,

    #[error("Server error")]
    ServerError,

    /// Any other non-2xx status, with the status line's reason phrase.
    #[error("Failed to fetch weather: {reason}")]
    Unknown { status: u16, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("No internet connection")]
    NoConnectivity,

    /// The provider answered 2xx but the body did not decode.
    #[error("Failed to fetch weather: {0}")]
    Malformed(String),

    /// The location collaborator could not supply a coordinate.
    #[error("{0}")]
    LocationUnavailable(String),

    #[error("Failed to fetch weather: {0}")]
    Unexpected(String),
}

impl ErrorKind {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, reason: Option<&str>) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            500 => ErrorKind::ServerError,
            _ => {
                let reason = reason
                    .map(str::to_owned)
                    .or_else(|| {
                        reqwest::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .map(str::to_owned)
                    })
                    .unwrap_or_else(|| status.to_string());
                ErrorKind::Unknown { status, reason }
            }
        }
    }
}
