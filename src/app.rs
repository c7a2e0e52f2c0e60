//! Application wiring.
//!
//! [`Platform::bootstrap`] turns validated [`Settings`] into ready-to-use
//! services:
//! - a [`SecretsManager`] over the configured backend, cached when
//!   `secrets.cacheTtlSeconds > 0`
//! - a factory for named [`InMemoryCache`]s
//!
//! Environment gating: test environments always get an
//! [`InMemorySecretStore`], and asking for a production backend (`aws`,
//! `vault`) with `env.type = test` is a [`ErrorKind::BadState`] error.
//!
//! [`ErrorKind::BadState`]: crate::errors::ErrorKind::BadState

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cache::InMemoryCache;
use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::secrets::{
    CachedSecretsManager, EnvVarSecretStore, InMemorySecretStore, NamespacedSecretsManager,
    SecretBackendType, SecretNaming, SecretStore, SecretsError, SecretsManager, VaultSecretStore,
    VaultStoreConfig,
};

pub struct Platform {
    settings: Settings,
    secrets: Arc<dyn SecretsManager>,
    memory_store: Option<Arc<InMemorySecretStore>>,
}

impl Platform {
    /// Build the platform for `settings`.
    ///
    /// # Errors
    ///
    /// - [`Error::BadArgument`] if `settings` fail validation
    /// - [`Error::Secrets`] with kind `BadState` for a production backend in a
    ///   test environment
    /// - [`Error::Secrets`] if the backend client cannot be constructed
    pub async fn bootstrap(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let backend = settings.secrets.backend;
        if settings.env.kind.is_test() {
            if backend.is_production() {
                return Err(SecretsError::bad_state(format!(
                    "secrets backend '{}' cannot be used when env.type is 'test'",
                    backend
                ))
                .into());
            }
            let store = Arc::new(InMemorySecretStore::new());
            let mut platform = Self::with_store(settings, Arc::clone(&store) as Arc<dyn SecretStore>)?;
            platform.memory_store = Some(store);
            return Ok(platform);
        }

        let store = build_store(&settings).await?;
        Self::with_store(settings, store)
    }

    /// Build the platform over an already constructed store.
    ///
    /// Skips environment gating; meant for embedding applications and tests
    /// that bring their own store.
    pub fn with_store(settings: Settings, store: Arc<dyn SecretStore>) -> Result<Self> {
        let naming = SecretNaming::new(
            &settings.app_name,
            &settings.env.name,
            &settings.secrets.prefix_fmt,
            &settings.secrets.key_fmt,
        )?;

        let backend = store.backend_type();
        let manager = NamespacedSecretsManager::new(store, naming.clone())
            .with_tracing(settings.datadog.tracing);

        let secrets: Arc<dyn SecretsManager> = match settings.secrets.cache_ttl() {
            Some(ttl) => Arc::new(CachedSecretsManager::new(manager, naming.clone(), ttl)?),
            None => Arc::new(manager),
        };

        info!(
            app_name = %settings.app_name,
            env_name = %settings.env.name,
            env_type = %settings.env.kind,
            backend = %backend,
            prefix = %naming.prefix(),
            cache_ttl_seconds = settings.secrets.cache_ttl_seconds,
            "Platform initialized"
        );

        Ok(Self { settings, secrets, memory_store: None })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shared secrets manager.
    pub fn secrets(&self) -> Arc<dyn SecretsManager> {
        Arc::clone(&self.secrets)
    }

    /// The in-memory store backing a test environment, for seeding secrets.
    pub fn memory_store(&self) -> Option<&Arc<InMemorySecretStore>> {
        self.memory_store.as_ref()
    }

    /// Create a named cache.
    pub fn cache<T>(&self, name: &str, ttl: Duration) -> Result<InMemoryCache<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        Ok(InMemoryCache::new(name, ttl)?)
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("app_name", &self.settings.app_name)
            .field("env", &self.settings.env.name)
            .field("backend", &self.settings.secrets.backend)
            .finish()
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn SecretStore>> {
    let secrets = &settings.secrets;
    match secrets.backend {
        SecretBackendType::Env => Ok(Arc::new(EnvVarSecretStore::new())),
        SecretBackendType::Vault => {
            let address = secrets
                .vault
                .address
                .clone()
                .ok_or_else(|| Error::bad_argument("secrets.vault.address is required"))?;
            let store = VaultSecretStore::new(VaultStoreConfig {
                address,
                token: secrets.vault.token.clone(),
                namespace: secrets.vault.namespace.clone(),
                mount_path: secrets.vault.mount_path.clone(),
            })?;
            Ok(Arc::new(store))
        }
        SecretBackendType::AwsSecretsManager => build_aws_store(settings).await,
        SecretBackendType::Memory => Err(SecretsError::bad_state(
            "secrets backend 'memory' is only available when env.type is 'test'",
        )
        .into()),
    }
}

#[cfg(feature = "aws")]
async fn build_aws_store(settings: &Settings) -> Result<Arc<dyn SecretStore>> {
    use crate::secrets::{AwsSecretStore, AwsStoreConfig};

    let config = AwsStoreConfig {
        region: settings.secrets.aws.region.clone(),
        endpoint: settings.secrets.aws.endpoint.clone(),
    };
    Ok(Arc::new(AwsSecretStore::new(&config).await))
}

#[cfg(not(feature = "aws"))]
async fn build_aws_store(_settings: &Settings) -> Result<Arc<dyn SecretStore>> {
    Err(SecretsError::config_error("secrets backend 'aws' requires the 'aws' feature").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::config::{DatadogSettings, EnvSettings, EnvironmentType, LoggingSettings, SecretsSettings};
    use crate::context::Context;
    use crate::errors::ErrorKind;
    use tracing_test::traced_test;

    fn settings(kind: EnvironmentType, backend: SecretBackendType) -> Settings {
        Settings {
            app_name: "svc".to_string(),
            env: EnvSettings { name: "dev1".to_string(), kind },
            secrets: SecretsSettings { backend, ..SecretsSettings::default() },
            datadog: DatadogSettings::default(),
            logging: LoggingSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_production_backend_rejected_under_test() {
        for backend in [SecretBackendType::Vault, SecretBackendType::AwsSecretsManager] {
            let mut s = settings(EnvironmentType::Test, backend);
            s.secrets.vault.address = Some("http://127.0.0.1:8200".to_string());
            let err = Platform::bootstrap(s).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadState, "{:?}", err);
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_bootstrap_logs_without_secret_values() {
        let mut s = settings(EnvironmentType::Test, SecretBackendType::Memory);
        s.datadog.tracing = true;
        let platform = Platform::bootstrap(s).await.unwrap();
        platform.memory_store().unwrap().insert("svc/dev1/db-pwd", "hunter2");

        let value = platform.secrets().get_secret(&Context::background(), "db-pwd").await.unwrap();
        assert_eq!(value, "hunter2");

        assert!(logs_contain("Platform initialized"));
        assert!(logs_contain("svc/dev1/db-pwd"));
        assert!(!logs_contain("hunter2"));
    }

    #[tokio::test]
    async fn test_test_environment_uses_memory_store() {
        let platform = Platform::bootstrap(settings(EnvironmentType::Test, SecretBackendType::Env))
            .await
            .unwrap();
        let store = platform.memory_store().unwrap();
        store.insert("svc/dev1/db-pwd", "hunter2");

        let value = platform.secrets().get_secret(&Context::background(), "db-pwd").await.unwrap();
        assert_eq!(value, "hunter2");
    }

    #[tokio::test]
    async fn test_env_backend_outside_test() {
        let platform =
            Platform::bootstrap(settings(EnvironmentType::Development, SecretBackendType::Env))
                .await
                .unwrap();
        assert!(platform.memory_store().is_none());

        let err = platform
            .secrets()
            .get_secret(&Context::background(), "app-test-never-set")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_vault_backend_builds_without_connecting() {
        let mut s = settings(EnvironmentType::Production, SecretBackendType::Vault);
        s.secrets.vault.address = Some("http://127.0.0.1:8200".to_string());
        s.secrets.vault.token = Some("root".to_string());
        assert!(Platform::bootstrap(s).await.is_ok());
    }

    #[cfg(not(feature = "aws"))]
    #[tokio::test]
    async fn test_aws_backend_requires_feature() {
        let s = settings(EnvironmentType::Production, SecretBackendType::AwsSecretsManager);
        let err = Platform::bootstrap(s).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadArgument);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let mut s = settings(EnvironmentType::Test, SecretBackendType::Env);
        s.secrets.key_fmt = "no verb".to_string();
        let err = Platform::bootstrap(s).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadArgument);
    }

    #[tokio::test]
    async fn test_cached_secrets_when_ttl_configured() {
        let mut s = settings(EnvironmentType::Test, SecretBackendType::Env);
        s.secrets.cache_ttl_seconds = 60;
        let platform = Platform::bootstrap(s).await.unwrap();
        let store = platform.memory_store().unwrap();
        store.insert("svc/dev1/k", "v1");

        let ctx = Context::background();
        assert_eq!(platform.secrets().get_secret(&ctx, "k").await.unwrap(), "v1");
        store.insert("svc/dev1/k", "v2");
        assert_eq!(platform.secrets().get_secret(&ctx, "k").await.unwrap(), "v1");
        assert_eq!(store.requested_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_factory() {
        let platform = Platform::bootstrap(settings(EnvironmentType::Test, SecretBackendType::Env))
            .await
            .unwrap();
        let cache = platform.cache::<i64>("t", Duration::from_secs(60)).unwrap();
        cache.set("a", &1).unwrap();
        assert_eq!(cache.get("a").unwrap(), 1);

        let err = platform.cache::<i64>("t", Duration::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadArgument);
    }
}
