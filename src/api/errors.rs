//! Photos API Error Types
//!
//! Structured error handling for Google Photos API operations.
//! Maps HTTP status codes to specific error variants for retry decisions.

/// Photos API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: access token rejected")]
    Unauthorized,

    #[error("Unexpected status ({0}): {1}")]
    BadStatus(u16, String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the access token should be refreshed and the call retried
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Create an ApiError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            _ => ApiError::BadStatus(status, body.to_string()),
        }
    }
}
