//! Error types for client operations.

use thiserror::Error;
use tideway_transport::{StatusCode, TransportError};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the search client.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input, caught before any request is issued.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The addressed resource does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// A bulk operation could not be encoded.
    #[error("Bulk operation {op} could not be encoded: {reason}")]
    Encoding {
        /// Zero-based position of the failing operation.
        op: usize,
        /// Why the operation was rejected.
        reason: String,
    },

    /// The bulk body writer task did not run to completion.
    #[error("Bulk writer task failed: {0}")]
    BulkWriter(String),

    /// The engine answered with an unexpected body shape.
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Check whether this error reports a missing resource, either mapped
    /// or as a raw 404 from the engine.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// HTTP status carried by the underlying transport error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn is_pipe_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::PipeClosed))
    }

    /// Turn a 404 transport error into [`Error::NotFound`] for `resource`.
    pub(crate) fn map_not_found(self, resource: impl FnOnce() -> String) -> Self {
        match self {
            Self::Transport(TransportError::Status { status, .. })
                if status == StatusCode::NOT_FOUND =>
            {
                Self::NotFound { resource: resource() }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = Error::NotFound { resource: "index articles".to_string() };
        assert!(err.is_not_found());
        assert!(!Error::Validation("nope".to_string()).is_not_found());
    }

    #[test]
    fn test_pipe_closed_detection() {
        assert!(Error::Transport(TransportError::PipeClosed).is_pipe_closed());
        assert!(!Error::BulkWriter("panicked".to_string()).is_pipe_closed());
    }
}
