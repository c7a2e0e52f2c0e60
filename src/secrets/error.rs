//! Error types for secrets lookups.

use thiserror::Error;

use crate::context::ContextError;
use crate::errors::ErrorKind;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the backend.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// The caller's context was cancelled or its deadline passed.
    #[error("Secret lookup aborted: {0}")]
    Cancelled(#[from] ContextError),

    /// Failed to connect to the secrets backend.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Authentication with the secrets backend failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Stored value has the wrong shape or encoding.
    #[error("Invalid secret value: {reason}")]
    InvalidValue { reason: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Backend not permitted in the current environment.
    #[error("Bad state: {message}")]
    BadState { message: String },

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create an invalid value error.
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue { reason: reason.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Create a bad state error.
    pub fn bad_state(message: impl Into<String>) -> Self {
        Self::BadState { message: message.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConfigError { .. } => ErrorKind::BadArgument,
            Self::BadState { .. } => ErrorKind::BadState,
            Self::Cancelled(_)
            | Self::ConnectionFailed { .. }
            | Self::AuthenticationFailed { .. }
            | Self::InvalidValue { .. }
            | Self::BackendError { .. }
            | Self::Internal { .. } => ErrorKind::Unknown,
        }
    }
}
