//! Transport error types.

use http::StatusCode;
use thiserror::Error;

use crate::response::ApiResponse;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The base URL cannot address the engine.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON body serialization error.
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("Request failed with status {status} for {url}")]
    Status {
        /// Status the engine returned.
        status: StatusCode,
        /// URL the request was sent to.
        url: String,
        /// Engine response, decoded when possible.
        response: ApiResponse,
    },

    /// The streaming body consumer went away while the writer was still
    /// producing chunks.
    #[error("Request body pipe closed")]
    PipeClosed,
}

impl TransportError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Engine response attached to a status error.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}
