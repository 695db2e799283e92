//! Error types for the geometry service client.

use geoedit_core::RemoteOperationError;
use thiserror::Error;

use crate::protocol::Operation;

/// Errors raised while talking to the geometry service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status and no parsable body.
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not the expected JSON shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

impl ServiceError {
    /// Folds a transport-level failure into the engine's remote error kind.
    pub fn into_remote(self, operation: Operation) -> RemoteOperationError {
        RemoteOperationError::Transport {
            operation: operation.to_string(),
            reason: self.to_string(),
        }
    }
}

/// Result type alias for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
