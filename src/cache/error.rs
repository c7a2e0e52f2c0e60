//! Error types for cache operations.

use thiserror::Error;

use crate::errors::ErrorKind;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired. Callers branch on this with
    /// [`CacheError::is_not_found`].
    #[error("Cache entry not found: {key}")]
    EntryNotFound { key: String },

    /// TTL must be strictly positive.
    #[error("Invalid TTL for cache '{cache}': TTL must be greater than zero")]
    InvalidTtl { cache: String },

    /// Keys must be non-empty.
    #[error("Invalid cache key: {reason}")]
    InvalidKey { reason: String },

    /// Value could not be encoded for storage.
    #[error("Failed to encode cache value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: ciborium::ser::Error<std::io::Error>,
    },

    /// Stored bytes could not be decoded into the cache's value type.
    #[error("Failed to decode cache value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: ciborium::de::Error<std::io::Error>,
    },

    /// Backing store failure.
    #[error("Cache backend error: {message}")]
    Backend { message: String },
}

impl CacheError {
    /// Create an entry not found error.
    pub fn entry_not_found(key: impl Into<String>) -> Self {
        Self::EntryNotFound { key: key.into() }
    }

    /// Create an invalid key error.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { reason: reason.into() }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }

    /// Whether this is the entry-not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntryNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTtl { .. } | Self::InvalidKey { .. } => ErrorKind::BadArgument,
            Self::Encode { .. } | Self::Decode { .. } | Self::Backend { .. } => ErrorKind::Unknown,
        }
    }
}
