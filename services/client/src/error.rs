//! services/client/src/error.rs
//!
//! Defines the error types for the client service: `SessionError` for the
//! session manager's operations and `ClientError` for the binary as a whole.

use crate::config::ConfigError;
use pocket_rag_core::ports::PortError;

/// Failure of a session manager operation.
///
/// None of these are fatal; every variant leaves the session interactive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The backend refused the request and said why.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or answered with something unreadable.
    #[error("Network error: {0}")]
    Transport(String),
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        SessionError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

impl From<PortError> for SessionError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Rejected { detail, .. } => SessionError::Rejected(detail),
            PortError::Transport(message) => SessionError::Transport(message),
        }
    }
}

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading the terminal or a file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
