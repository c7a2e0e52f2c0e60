//! # Error Types
//!
//! Crate-wide error type. Subsystems keep their own error enums
//! ([`CacheError`](crate::cache::CacheError),
//! [`SecretsError`](crate::secrets::SecretsError)) and convert into [`Error`]
//! at the application boundary.

use std::fmt;

use crate::cache::CacheError;
use crate::secrets::SecretsError;

/// Custom result type for servicekit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification shared by every error in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entry or secret does not exist
    NotFound,
    /// Caller supplied an invalid argument (non-positive TTL, malformed URL)
    BadArgument,
    /// Operation not allowed in the current state (production client under test)
    BadState,
    /// Anything wrapped from a third-party or system error
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadArgument => "bad_argument",
            ErrorKind::BadState => "bad_state",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Resource not found errors
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Invalid argument errors
    #[error("Bad argument: {message}")]
    BadArgument { message: String },

    /// Invalid state errors
    #[error("Bad state: {message}")]
    BadState { message: String },

    /// Configuration loading errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cache errors
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Secrets errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound { message: message.into() }
    }

    /// Create a bad argument error
    pub fn bad_argument<S: Into<String>>(message: S) -> Self {
        Self::BadArgument { message: message.into() }
    }

    /// Create a bad state error
    pub fn bad_state<S: Into<String>>(message: S) -> Self {
        Self::BadState { message: message.into() }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create an internal error with source
    pub fn internal_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::BadArgument { .. } => ErrorKind::BadArgument,
            Error::BadState { .. } => ErrorKind::BadState,
            Error::Config { .. } => ErrorKind::BadArgument,
            Error::Cache(e) => e.kind(),
            Error::Secrets(e) => e.kind(),
            Error::Internal { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::internal_with_source("I/O operation failed", Box::new(error))
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source(format!("Configuration loading failed: {}", error), Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();

        for (field, nested) in errors.errors() {
            if let validator::ValidationErrorsKind::Struct(inner) = nested {
                if let Error::BadArgument { message } = Error::from(*inner.clone()) {
                    fields.push(format!("{}.{}", field, message.trim_start_matches("Validation failed: ")));
                }
            }
        }
        fields.sort();

        Self::bad_argument(format!("Validation failed: {}", fields.join("; ")))
    }
}
