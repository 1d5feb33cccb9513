//! Error types for the inference gateway.

use thiserror::Error;

/// Errors that can occur when calling the external inference provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (network, TLS, timeout).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs.
        body: String,
    },

    /// Provider answered 2xx but the payload is missing expected fields.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Request or response body (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid gateway configuration.
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl GatewayError {
    /// Whether the failure is transient (network flakiness, timeout,
    /// provider overload) rather than a caller mistake.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse(_) | Self::Json(_) | Self::InvalidConfig(_) => false,
        }
    }
}

/// Convenience result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
