//! API error types

use thiserror::Error;

/// Errors from backend requests
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL or an endpoint path is invalid
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request could not be sent or timed out
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the credential; the stored session was cleared
    #[error("not authorized, please log in again")]
    Unauthorized,

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
