//! Sync error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur talking to the remote diary service.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote sync not configured. Set api.endpoint and api.api_key in config.")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    #[error("Server rejected request: {0}")]
    Rejected(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
