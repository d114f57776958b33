//! Error types for upstream data sources and the insight generator.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors fetching from the NBA stats or live-data endpoints.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Request timed out.
    #[error("upstream timeout: {0}")]
    Timeout(String),

    /// Upstream answered 429.
    #[error("upstream rate limit exceeded")]
    RateLimited {
        /// Seconds from `Retry-After`, when sent.
        retry_after_secs: Option<u64>,
    },

    /// Non-success status other than 429.
    #[error("upstream HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Body did not have the expected shape.
    #[error("unexpected upstream payload: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a payload shape error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Returns true if a later retry may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Why a text-generation call produced no insights. Never leaves the generator.
#[derive(Debug, Error)]
pub enum InsightError {
    /// Certificate verification or TLS handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    #[error("insight request timeout: {0}")]
    Timeout(String),

    #[error("insight API error: {status} - {body}")]
    Http { status: u16, body: String },

    /// The response carried no usable text.
    #[error("no text returned from insight API")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        if is_tls_failure(&err) {
            Self::Tls(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Walks the source chain looking for a certificate or TLS failure.
pub(crate) fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let msg = e.to_string().to_ascii_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| msg.contains(needle))
        {
            return true;
        }
        current = e.source();
    }
    false
}
