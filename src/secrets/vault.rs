//! HashiCorp Vault secret store (KV v2).
//!
//! Each qualified id is a KV v2 path under the configured mount. The string
//! value lives in the `value` field; binary secrets are read from a base64
//! `binary` field, falling back to the raw bytes of `value`:
//!
//! ```bash
//! vault kv put secret/svc/dev1/db-pwd value=hunter2
//! vault kv put secret/svc/dev1/tls-key binary=@key.der.b64
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::error::{Result, SecretsError};
use super::store::{SecretBackendType, SecretStore};

/// Field holding the string value of a secret.
pub const VALUE_FIELD: &str = "value";
/// Field holding the base64 payload of a binary secret.
pub const BINARY_FIELD: &str = "binary";

/// Configuration for the Vault store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultStoreConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,
    /// Vault authentication token
    pub token: Option<String>,
    /// Vault namespace (for Enterprise)
    pub namespace: Option<String>,
    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

pub fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultStoreConfig {
    fn default() -> Self {
        Self { address: "http://127.0.0.1:8200".to_string(), token: None, namespace: None, mount_path: default_mount_path() }
    }
}

pub struct VaultSecretStore {
    client: VaultClient,
    mount_path: String,
}

impl fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("mount_path", &self.mount_path)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultSecretStore {
    /// Build a client for `config`. No request is made until the first
    /// lookup or [`health_check`](Self::health_check).
    ///
    /// # Errors
    ///
    /// - [`SecretsError::ConfigError`] if the address is empty or rejected
    /// - [`SecretsError::ConnectionFailed`] if the HTTP client cannot be built
    pub fn new(config: VaultStoreConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }
        if config.mount_path.is_empty() {
            return Err(SecretsError::config_error("Vault mount path cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(ref namespace) = config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder
            .build()
            .map_err(|e| SecretsError::config_error(format!("Invalid Vault configuration: {}", e)))?;

        let client = VaultClient::new(settings)
            .map_err(|e| SecretsError::connection_failed(format!("Failed to create Vault client: {}", e)))?;

        info!(address = %config.address, mount_path = %config.mount_path, "Initialized Vault secret store");

        Ok(Self { client, mount_path: config.mount_path })
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Ask Vault for its health status.
    pub async fn health_check(&self) -> Result<()> {
        vaultrs::sys::health(&self.client).await.map(|_| ()).map_err(|e| {
            error!(error = %e, "Vault health check failed");
            SecretsError::connection_failed(format!("Vault health check failed: {}", e))
        })
    }

    async fn read(&self, id: &str) -> Result<HashMap<String, serde_json::Value>> {
        kv2::read(&self.client, &self.mount_path, id).await.map_err(|e| map_client_error(id, e))
    }
}

fn map_client_error(id: &str, err: ClientError) -> SecretsError {
    match err {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(id),
        ClientError::APIError { code: 401 | 403, ref errors } => {
            SecretsError::authentication_failed(format!("Vault denied access to '{}': {}", id, errors.join(", ")))
        }
        ClientError::RestClientError { .. } => {
            SecretsError::connection_failed(format!("Vault request for '{}' failed: {}", id, err))
        }
        other => SecretsError::backend_error(format!("Failed to read secret '{}' from Vault: {}", id, other)),
    }
}

fn string_field(id: &str, data: &HashMap<String, serde_json::Value>) -> Result<String> {
    match data.get(VALUE_FIELD) {
        Some(serde_json::Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(SecretsError::invalid_value(format!("Field '{}' of '{}' is not a string", VALUE_FIELD, id))),
        None => Err(SecretsError::invalid_value(format!("Secret '{}' has no '{}' field", id, VALUE_FIELD))),
    }
}

fn binary_field(id: &str, data: &HashMap<String, serde_json::Value>) -> Result<Vec<u8>> {
    match data.get(BINARY_FIELD) {
        Some(serde_json::Value::String(encoded)) => STANDARD.decode(encoded.trim()).map_err(|e| {
            SecretsError::invalid_value(format!("Field '{}' of '{}' is not valid base64: {}", BINARY_FIELD, id, e))
        }),
        Some(_) => Err(SecretsError::invalid_value(format!("Field '{}' of '{}' is not a string", BINARY_FIELD, id))),
        None => string_field(id, data).map(String::into_bytes),
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get_secret_string(&self, id: &str) -> Result<String> {
        let data = self.read(id).await?;
        string_field(id, &data)
    }

    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>> {
        let data = self.read(id).await?;
        binary_field(id, &data)
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::Vault
    }
}
