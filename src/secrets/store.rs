//! Secret store trait and the in-process store.
//!
//! A [`SecretStore`] resolves fully qualified ids against one backend.
//! Namespacing, cancellation and logging live in
//! [`NamespacedSecretsManager`](super::NamespacedSecretsManager).

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::{Result, SecretsError};

/// Type of secret backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretBackendType {
    /// AWS Secrets Manager
    #[serde(alias = "aws")]
    AwsSecretsManager,
    /// HashiCorp Vault KV v2
    Vault,
    /// Process environment (development only)
    Env,
    /// In-process map (tests)
    Memory,
}

impl SecretBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsSecretsManager => "aws_secrets_manager",
            Self::Vault => "vault",
            Self::Env => "env",
            Self::Memory => "memory",
        }
    }

    /// Whether this backend talks to real infrastructure.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::AwsSecretsManager | Self::Vault)
    }
}

impl FromStr for SecretBackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "aws_secrets_manager" | "aws" => Ok(Self::AwsSecretsManager),
            "vault" => Ok(Self::Vault),
            "env" => Ok(Self::Env),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown secret backend type: {}", s)),
        }
    }
}

impl fmt::Display for SecretBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend that resolves fully qualified secret ids.
///
/// Implementations must be Send + Sync for use in async contexts and must
/// never log secret values.
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// String value stored under `id`.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if nothing is stored under `id`
    /// - [`SecretsError::InvalidValue`] if the stored value is not a string
    async fn get_secret_string(&self, id: &str) -> Result<String>;

    /// Raw bytes stored under `id`.
    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> SecretBackendType;
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for Arc<S> {
    async fn get_secret_string(&self, id: &str) -> Result<String> {
        (**self).get_secret_string(id).await
    }

    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>> {
        (**self).get_secret_binary(id).await
    }

    fn backend_type(&self) -> SecretBackendType {
        (**self).backend_type()
    }
}

/// In-process secret store used under test environments.
///
/// Records every id it is asked for so tests can assert on id composition.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    strings: DashMap<String, String>,
    binaries: DashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_secret(self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(id, value);
        self
    }

    /// Builder form of [`insert_binary`](Self::insert_binary).
    pub fn with_binary(self, id: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert_binary(id, value);
        self
    }

    /// Delay every lookup by `latency`, simulating a remote round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, id: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(id.into(), value.into());
    }

    pub fn insert_binary(&self, id: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.binaries.insert(id.into(), value.into());
    }

    pub fn remove(&self, id: &str) {
        self.strings.remove(id);
        self.binaries.remove(id);
    }

    /// Ids looked up so far, in request order.
    pub fn requested_ids(&self) -> Vec<String> {
        self.requested.lock().map(|ids| ids.clone()).unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record(&self, id: &str) {
        let mut ids = self.requested.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.push(id.to_string());
    }

    async fn round_trip(&self, id: &str) {
        self.record(id);
        tracing::debug!(secret_id = %id, "In-memory secret lookup");
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret_string(&self, id: &str) -> Result<String> {
        self.round_trip(id).await;
        self.strings.get(id).map(|v| v.value().clone()).ok_or_else(|| SecretsError::not_found(id))
    }

    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>> {
        self.round_trip(id).await;
        if let Some(bytes) = self.binaries.get(id) {
            return Ok(bytes.value().clone());
        }
        self.strings.get(id).map(|v| v.value().as_bytes().to_vec()).ok_or_else(|| SecretsError::not_found(id))
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_roundtrip() {
        for bt in [
            SecretBackendType::AwsSecretsManager,
            SecretBackendType::Vault,
            SecretBackendType::Env,
            SecretBackendType::Memory,
        ] {
            let parsed: SecretBackendType = bt.as_str().parse().unwrap();
            assert_eq!(bt, parsed);
        }
        assert_eq!("aws".parse::<SecretBackendType>().unwrap(), SecretBackendType::AwsSecretsManager);
        assert!("database".parse::<SecretBackendType>().is_err());
    }

    #[test]
    fn test_backend_type_serialization() {
        let json = serde_json::to_string(&SecretBackendType::AwsSecretsManager).unwrap();
        assert_eq!(json, "\"aws_secrets_manager\"");
        let parsed: SecretBackendType = serde_json::from_str("\"env\"").unwrap();
        assert_eq!(parsed, SecretBackendType::Env);
        let parsed: SecretBackendType = serde_json::from_str("\"aws\"").unwrap();
        assert_eq!(parsed, SecretBackendType::AwsSecretsManager);
    }

    #[test]
    fn test_production_backends() {
        assert!(SecretBackendType::AwsSecretsManager.is_production());
        assert!(SecretBackendType::Vault.is_production());
        assert!(!SecretBackendType::Env.is_production());
        assert!(!SecretBackendType::Memory.is_production());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySecretStore::new().with_secret("svc/dev1/a", "1").with_binary("svc/dev1b", vec![0u8, 159]);

        assert_eq!(store.get_secret_string("svc/dev1/a").await.unwrap(), "1");
        assert_eq!(store.get_secret_binary("svc/dev1b").await.unwrap(), vec![0u8, 159]);
        assert_eq!(store.get_secret_binary("svc/dev1/a").await.unwrap(), b"1".to_vec());
        assert!(store.get_secret_string("missing").await.unwrap_err().is_not_found());

        assert_eq!(store.requested_ids(), vec!["svc/dev1/a", "svc/dev1b", "svc/dev1/a", "missing"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemorySecretStore::new().with_secret("a", "1");
        store.remove("a");
        assert!(store.get_secret_string("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_arc_dyn_store() {
        let store: Arc<dyn SecretStore> = Arc::new(InMemorySecretStore::new().with_secret("a", "1"));
        assert_eq!(store.get_secret_string("a").await.unwrap(), "1");
        assert_eq!(store.backend_type(), SecretBackendType::Memory);
    }
}
