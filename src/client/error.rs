//! Error types for the transport client.

use thiserror::Error;

/// Errors that can occur while talking to the `PharmaBot` backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client configuration rejected before any request was made.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Base URL or request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Connection failure or any other I/O level request error.
    #[error("Connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Backend answered with a non-2xx status.
    #[error("Backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually a `{"detail": ...}` payload.
        body: String,
    },

    /// Response body was not the expected JSON document.
    #[error("Malformed response body (status {status}): {source}")]
    Decode {
        /// HTTP status code of the response that failed to decode.
        status: u16,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Connection(err)
        }
    }
}

impl TransportError {
    /// HTTP status carried by this error, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Convenience result alias for transport operations.
pub type ApiResult<T> = Result<T, TransportError>;
