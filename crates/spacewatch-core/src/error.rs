// Error types for the status-mirroring pipeline

use std::time::Duration;

use thiserror::Error;

/// Result type alias for spacewatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while polling the feed or writing presence
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure, request timeout, or non-success HTTP status from the
    /// status endpoint
    #[error("network error talking to status endpoint: {0}")]
    Network(String),

    /// The endpoint responded but the body is structurally unusable
    #[error("malformed status response: {0}")]
    MalformedResponse(String),

    /// The overall retry deadline elapsed before any attempt succeeded
    #[error("status fetch exceeded the overall deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// A nickname or channel rename failed on the chat platform
    #[error("presence write to {target} failed: {message}")]
    PresenceWrite { target: String, message: String },

    /// One-time startup failure (identity setup, asset loading). Fatal.
    #[error("setup failed: {0}")]
    Setup(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse(msg.into())
    }

    /// Create a presence-write error
    pub fn presence_write(target: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PresenceWrite {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a setup error
    pub fn setup(msg: impl Into<String>) -> Self {
        Error::Setup(msg.into())
    }

    /// Whether another attempt within the same tick can plausibly succeed.
    ///
    /// A malformed body will not fix itself by retrying; transport failures
    /// might. Everything outside the fetch path is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
