//! Error types for the portfolio client
//!
//! Every failure the client can surface to a caller is one of these kinds.
//! Offline fallbacks are not errors; they are reported through
//! [`Outcome::Offline`](crate::client::Outcome) and
//! [`ContactReceipt::SavedOffline`](crate::client::ContactReceipt).

use thiserror::Error;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or malformed contact form fields
    #[error("{0}")]
    Validation(String),

    /// The request could not be completed
    #[error("Network error: {0}")]
    Network(String),

    /// The request completed but the server reported failure
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A successful response carried a body that was not JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local submission storage could not be read or written
    #[error("{0}")]
    Storage(String),

    /// A raw request was attempted while the backend is disabled
    #[error("Backend disabled (offline mode)")]
    Offline,

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ClientError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        ClientError::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ClientError::Config(msg.into())
    }

    /// Build an API error from a response status and an optional server message
    pub fn api(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("API Error {}", status));
        ClientError::Api { status, message }
    }

    /// Check if the user can fix this error by changing their input
    pub fn is_user_error(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Check if trying the same operation again later might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
