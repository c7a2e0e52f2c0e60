//! Secrets lookup for service configuration.
//!
//! Applications depend on the [`SecretsManager`] trait. The standard
//! implementation, [`NamespacedSecretsManager`], turns a logical name into a
//! fully qualified id (`<app>/<env>/<name>` by default, see [`SecretNaming`])
//! and reads it from a [`SecretStore`]:
//!
//! - [`AwsSecretStore`]: AWS Secrets Manager (feature `aws`)
//! - [`VaultSecretStore`]: HashiCorp Vault KV v2
//! - [`EnvVarSecretStore`]: `SERVICEKIT_SECRET_*` variables, development only
//! - [`InMemorySecretStore`]: in-process fake for test environments
//!
//! [`CachedSecretsManager`] layers an in-memory TTL cache over any manager.
//!
//! # Example
//!
//! ```rust,ignore
//! use servicekit::context::Context;
//! use servicekit::secrets::{
//!     CachedSecretsManager, NamespacedSecretsManager, SecretNaming, SecretsManager,
//!     VaultSecretStore, VaultStoreConfig,
//! };
//! use std::time::Duration;
//!
//! let store = VaultSecretStore::new(VaultStoreConfig {
//!     address: "https://vault.example.com".to_string(),
//!     token: Some(token),
//!     namespace: None,
//!     mount_path: "secret".to_string(),
//! })?;
//! let naming = SecretNaming::with_defaults("billing", "prod")?;
//! let manager = NamespacedSecretsManager::new(store, naming.clone());
//! let manager = CachedSecretsManager::new(manager, naming, Duration::from_secs(300))?;
//!
//! // reads secret/billing/prod/db-pwd
//! let password = manager.get_secret(&Context::background(), "db-pwd").await?;
//! ```
//!
//! Secret values are never logged; lookups log the qualified id only.

#[cfg(feature = "aws")]
pub mod aws;
pub mod cached;
pub mod env;
pub mod error;
pub mod manager;
pub mod naming;
pub mod store;
pub mod vault;

#[cfg(feature = "aws")]
pub use aws::{AwsSecretStore, AwsStoreConfig};
pub use cached::CachedSecretsManager;
pub use env::EnvVarSecretStore;
pub use error::{Result, SecretsError};
pub use manager::{NamespacedSecretsManager, SecretsManager};
pub use naming::{SecretNaming, DEFAULT_KEY_FMT, DEFAULT_PREFIX_FMT};
pub use store::{InMemorySecretStore, SecretBackendType, SecretStore};
pub use vault::{VaultSecretStore, VaultStoreConfig};
