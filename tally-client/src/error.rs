//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Upstream is rate limiting (HTTP 429 or THROTTLED)
    #[error("Throttled by upstream")]
    Throttled,

    /// GraphQL `errors` array was present
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Throttled)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
