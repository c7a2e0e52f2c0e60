//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. Events across the crate carry
//! structured fields rather than formatted text:
//!
//! | Field       | Emitted by                              |
//! |-------------|-----------------------------------------|
//! | `cache`     | [`InMemoryCache`](crate::cache::InMemoryCache) |
//! | `key`       | cache reads and writes                  |
//! | `secret_id` | secret lookups (the qualified id only)  |
//! | `backend`   | secret lookups and store construction   |
//!
//! `RUST_LOG` takes precedence over [`LoggingSettings::level`]. Output goes
//! to stderr.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LoggingSettings;
use crate::errors::{Error, Result};

/// Create a tracing span around a secret store call.
///
/// ```rust,ignore
/// let span = secrets_span!(SecretBackendType::Vault, "svc/dev1/db-pwd", "get_secret_string");
/// ```
#[macro_export]
macro_rules! secrets_span {
    ($backend:expr, $secret_id:expr, $operation:expr) => {
        tracing::info_span!(
            "secrets_store",
            backend = %$backend,
            secret_id = %$secret_id,
            operation = $operation
        )
    };
    ($backend:expr, $secret_id:expr, $operation:expr, $($field:tt)*) => {
        tracing::info_span!(
            "secrets_store",
            backend = %$backend,
            secret_id = %$secret_id,
            operation = $operation,
            $($field)*
        )
    };
}

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|e| {
        Error::bad_argument(format!("Invalid log level '{}': {}", settings.level, e))
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// - [`Error::BadArgument`] if `settings.level` is not a valid filter
/// - [`Error::Internal`] if a global subscriber is already installed
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = env_filter(settings)?;

    let installed = if settings.json {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish(),
        )
    };

    installed.map_err(|e| Error::internal(format!("Failed to install log subscriber: {}", e)))?;

    tracing::debug!(level = %settings.level, json = settings.json, "Logging initialized");
    Ok(())
}

/// Like [`init_logging`], but a subscriber installed elsewhere (test
/// harnesses, embedding applications) is not an error.
pub fn try_init_logging(settings: &LoggingSettings) -> Result<()> {
    match init_logging(settings) {
        Err(Error::Internal { .. }) => Ok(()),
        other => other,
    }
}
