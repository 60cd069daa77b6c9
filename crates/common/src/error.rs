//! Common error types for the todo service components.

use std::fmt;

/// A specialized Result type for todo service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for todo service operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The logical address could not be split or the DNS lookup came back empty.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// A connection or command against a store endpoint failed.
    #[error("{0}")]
    Connectivity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Other(String),
}

impl Error {
    /// Create a new resolution error.
    pub fn resolution(msg: impl fmt::Display) -> Self {
        Error::Resolution(msg.to_string())
    }

    /// Create a new connectivity error.
    pub fn connectivity(msg: impl fmt::Display) -> Self {
        Error::Connectivity(msg.to_string())
    }

    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new other error.
    pub fn other(msg: impl fmt::Display) -> Self {
        Error::Other(msg.to_string())
    }

    /// Whether this error came from talking to the store.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_error_displays_message_verbatim() {
        let err = Error::connectivity("dial tcp 10.0.0.1:6379: connection refused");
        assert_eq!(err.to_string(), "dial tcp 10.0.0.1:6379: connection refused");
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_resolution_error_prefix() {
        let err = Error::resolution("missing port in address");
        assert_eq!(err.to_string(), "Resolution error: missing port in address");
        assert!(!err.is_connectivity());
    }
}
