//! Error types for collector operations.
//!
//! This module defines [`DataError`] which covers the failures that can occur
//! while talking to the exchange, rendering pages, extracting documents, or
//! touching the cache and record store. Component facades recover from all of
//! them locally; the enum exists so the adapters underneath can use `?`.

use thiserror::Error;

/// Errors that can occur during collector operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// A request completed with a non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    Http {
        /// The returned status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A response did not carry the expected content type.
    #[error("Expected {expected} but got content type: {actual}")]
    ContentTypeMismatch {
        /// The content type that was expected.
        expected: String,
        /// The content type that was declared by the server.
        actual: String,
    },

    /// Browser rendering failed or timed out.
    #[error("Render error: {0}")]
    Render(String),

    /// Text could not be extracted from a PDF document.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Error reading or appending to the record store.
    #[error("Store error: {0}")]
    Store(String),

    /// The exchange session could not be primed.
    #[error("Session not established with {0}")]
    SessionNotEstablished(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Returns true for failures of the transport itself (network, HTTP status, rendering).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http { .. } | Self::Render(_) | Self::SessionNotEstablished(_)
        )
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(DataError::Network("reset".into()).is_transport());
        assert!(
            DataError::Http {
                status: 503,
                url: "https://example.com".into()
            }
            .is_transport()
        );
        assert!(!DataError::Parse("bad json".into()).is_transport());
        assert!(
            !DataError::ContentTypeMismatch {
                expected: "application/pdf".into(),
                actual: "text/html".into()
            }
            .is_transport()
        );
    }

    #[test]
    fn test_display() {
        let err = DataError::Http {
            status: 404,
            url: "https://example.com/x".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://example.com/x");
    }
}
