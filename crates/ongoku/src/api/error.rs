//! Project service error types.

use thiserror::Error;

/// Errors returned by the project service client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated")]
    AuthenticationRequired,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode server response: {0}")]
    Decode(String),

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl ApiError {
    /// Returns true for failures to reach the service at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

/// Result type for project service calls.
pub type Result<T> = std::result::Result<T, ApiError>;
