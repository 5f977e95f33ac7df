//! Error types for speech provider operations.

use std::fmt;

/// Provider-agnostic error shared by every speech collaborator.
///
/// Gateways map transport and vendor failures onto these variants so callers can decide
/// retry policy without knowing which vendor is behind a trait object.
#[derive(Debug)]
pub enum Error {
    /// API key rejected or missing permissions.
    Authentication(String),

    /// Connection, DNS or read failures. Usually transient.
    Network(String),

    /// Invalid or missing settings detected while building a request.
    Configuration(String),

    /// The vendor answered with an error of its own.
    Provider(String),

    /// Operation did not finish within its budget.
    Timeout(String),

    /// Requested operation or object does not exist.
    NotFound(String),

    /// Vendor rate limit exceeded.
    RateLimited { retry_after_seconds: u64 },

    /// Probing, transcoding or splitting media failed.
    Media(String),

    /// Object storage upload or delete failed.
    Storage(String),

    /// Work abandoned because the worker is shutting down.
    Cancelled(String),

    Serialization(String),

    Deserialization(String),

    /// Catch-all for local failures that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout(_) | Error::RateLimited { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "network error: {}", msg),
            Error::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "provider error: {}", msg),
            Error::Timeout(msg) => write!(f, "timeout: {}", msg),
            Error::NotFound(msg) => write!(f, "not found: {}", msg),
            Error::RateLimited {
                retry_after_seconds,
            } => {
                write!(f, "rate limited: retry after {}s", retry_after_seconds)
            }
            Error::Media(msg) => write!(f, "media error: {}", msg),
            Error::Storage(msg) => write!(f, "storage error: {}", msg),
            Error::Cancelled(msg) => write!(f, "cancelled: {}", msg),
            Error::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "deserialization error: {}", msg),
            Error::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::Deserialization(err.to_string())
        } else {
            Error::Serialization(err.to_string())
        }
    }
}
