//! # servicekit
//!
//! Building blocks for bootstrapping a service:
//!
//! - [`cache`]: typed, TTL-bounded in-memory cache behind the [`cache::Cache`] trait
//! - [`collections`]: concurrent map with single-flight `load_or_store`
//! - [`context`]: cancellation/deadline contexts, including detached contexts
//!   that outlive their parent
//! - [`secrets`]: namespaced secret lookup over AWS Secrets Manager, Vault,
//!   environment variables or an in-memory store
//! - [`config`]: layered settings (defaults, file, environment)
//! - [`app`]: [`Platform`] wiring with environment gating
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use servicekit::{context::Context, config::Settings, Platform, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load()?;
//!     servicekit::observability::try_init_logging(&settings.logging)?;
//!
//!     let platform = Platform::bootstrap(settings).await?;
//!     let password = platform.secrets().get_secret(&Context::background(), "db-pwd").await?;
//!     # let _ = password;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cache;
pub mod cli;
pub mod collections;
pub mod config;
pub mod context;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod utils;

// Re-export commonly used types and traits
pub use app::Platform;
pub use config::Settings;
pub use errors::{Error, ErrorKind, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "servicekit");
    }
}
