use std::time::Duration;
use thiserror::Error;

/// Failures talking to the image classifier
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Rate limited by the vision service")]
    RateLimited,

    #[error("Vision service request failed: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Vision service error: {code:?} - {message}")]
    Api { code: Option<i32>, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read image: {0}")]
    ImageRead(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl VisionError {
    /// Whether the same request may succeed if sent again.
    ///
    /// Timeouts, connection failures, 429 and 5xx are transient. Every other
    /// 4xx, API-level errors and unreadable responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            VisionError::Timeout(_) | VisionError::Connection(_) | VisionError::RateLimited => {
                true
            }
            VisionError::Http { status, .. } => *status >= 500,
            VisionError::Api { .. }
            | VisionError::InvalidResponse(_)
            | VisionError::ImageRead(_)
            | VisionError::Config(_) => false,
        }
    }
}

impl VisionError {
    /// Map a transport error, reporting timeouts against the configured limit
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            VisionError::Timeout(timeout)
        } else if err.is_decode() {
            VisionError::InvalidResponse(err.to_string())
        } else {
            VisionError::Connection(err.to_string())
        }
    }
}
