//! Environment variable secret store.
//!
//! Intended for **development only**. Environment variables are visible in
//! process listings and have no encryption or audit trail; use Vault or AWS
//! Secrets Manager for anything real.
//!
//! A qualified id maps to `SERVICEKIT_SECRET_<ID>` where `<ID>` is the id
//! upper-cased with every non-alphanumeric character replaced by `_`:
//!
//! ```bash
//! export SERVICEKIT_SECRET_SVC_DEV1_DB_PWD="hunter2"   # svc/dev1/db-pwd
//! ```
//!
//! Binary secrets are stored base64-encoded.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::env;

use super::error::{Result, SecretsError};
use super::store::{SecretBackendType, SecretStore};

/// Environment variable prefix for secrets.
pub const SECRET_ENV_PREFIX: &str = "SERVICEKIT_SECRET_";

/// Read-only secret store over the process environment.
#[derive(Debug, Clone)]
pub struct EnvVarSecretStore {
    prefix: String,
}

impl Default for EnvVarSecretStore {
    fn default() -> Self {
        Self { prefix: SECRET_ENV_PREFIX.to_string() }
    }
}

impl EnvVarSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a variable prefix other than `SERVICEKIT_SECRET_`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Environment variable consulted for `id`.
    pub fn env_var_name(&self, id: &str) -> String {
        let suffix: String =
            id.chars().map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' }).collect();
        format!("{}{}", self.prefix, suffix)
    }

    fn read(&self, id: &str) -> Result<String> {
        let var = self.env_var_name(id);
        match env::var(&var) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(SecretsError::not_found(format!(
                "Secret '{}' not found in environment (looking for {})",
                id, var
            ))),
            Err(env::VarError::NotUnicode(_)) => {
                Err(SecretsError::invalid_value(format!("{} is not valid UTF-8", var)))
            }
        }
    }
}

#[async_trait]
impl SecretStore for EnvVarSecretStore {
    async fn get_secret_string(&self, id: &str) -> Result<String> {
        self.read(id)
    }

    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>> {
        let encoded = self.read(id)?;
        STANDARD.decode(encoded.trim()).map_err(|e| {
            SecretsError::invalid_value(format!("{} is not valid base64: {}", self.env_var_name(id), e))
        })
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::Env
    }
}
