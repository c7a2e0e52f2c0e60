//! # Configuration Settings
//!
//! Defines the configuration structure for servicekit applications. Keys use
//! camelCase (`appName`, `secrets.prefixFmt`); the lower-cased spelling is
//! accepted as an alias.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::errors::{Error, Result};
use crate::secrets::naming::{DEFAULT_KEY_FMT, DEFAULT_PREFIX_FMT};
use crate::secrets::SecretBackendType;
use crate::utils::format::validate_template;
use crate::utils::redact;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Application name, first argument of the secret prefix format
    #[serde(alias = "appname")]
    #[validate(length(min = 1, message = "appName cannot be empty"))]
    pub app_name: String,

    /// Deployment environment
    #[validate(nested)]
    pub env: EnvSettings,

    /// Secret lookup configuration
    #[serde(default)]
    #[validate(nested)]
    pub secrets: SecretsSettings,

    #[serde(default)]
    pub datadog: DatadogSettings,

    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Cross-field rules the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.secrets.backend == SecretBackendType::Vault
            && self.secrets.vault.address.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::bad_argument("secrets.vault.address is required when secrets.backend is 'vault'"));
        }
        if self.secrets.backend == SecretBackendType::Memory && self.env.kind != EnvironmentType::Test {
            return Err(Error::bad_argument("secrets.backend 'memory' is only available when env.type is 'test'"));
        }
        Ok(())
    }

    /// Copy with credentials replaced by redacted placeholders.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.secrets.vault.token = copy.secrets.vault.token.as_deref().map(redact);
        copy
    }
}

/// Kind of environment the process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Test,
    #[default]
    #[serde(alias = "dev")]
    Development,
    #[serde(alias = "prod")]
    Production,
}

impl EnvironmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn is_test(&self) -> bool {
        *self == Self::Test
    }
}

impl std::fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EnvSettings {
    /// Environment name, second argument of the secret prefix format
    #[validate(length(min = 1, message = "env.name cannot be empty"))]
    pub name: String,

    /// Environment type (`test`, `development`, `production`)
    #[serde(rename = "type", default)]
    pub kind: EnvironmentType,
}

/// Secret lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SecretsSettings {
    /// Format of the namespace prefix; takes app name and env name
    #[serde(alias = "prefixfmt")]
    #[validate(custom(function = "validate_prefix_fmt"))]
    pub prefix_fmt: String,

    /// Format of the secret key; takes the secret name
    #[serde(alias = "keyfmt")]
    #[validate(custom(function = "validate_key_fmt"))]
    pub key_fmt: String,

    /// Backing store
    pub backend: SecretBackendType,

    /// Cache string secrets for this many seconds (0 = no cache)
    #[serde(alias = "cachettlseconds")]
    pub cache_ttl_seconds: u64,

    pub aws: AwsSettings,

    #[validate(nested)]
    pub vault: VaultSettings,
}

impl Default for SecretsSettings {
    fn default() -> Self {
        Self {
            prefix_fmt: DEFAULT_PREFIX_FMT.to_string(),
            key_fmt: DEFAULT_KEY_FMT.to_string(),
            backend: SecretBackendType::Env,
            cache_ttl_seconds: 0,
            aws: AwsSettings::default(),
            vault: VaultSettings::default(),
        }
    }
}

impl SecretsSettings {
    /// Secrets cache TTL, `None` when caching is off.
    pub fn cache_ttl(&self) -> Option<Duration> {
        if self.cache_ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.cache_ttl_seconds))
        }
    }
}

/// AWS Secrets Manager overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: Option<String>,
    /// Custom endpoint, e.g. LocalStack
    pub endpoint: Option<String>,
}

/// HashiCorp Vault configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultSettings {
    /// Vault server address
    pub address: Option<String>,
    /// Vault authentication token
    pub token: Option<String>,
    /// Vault namespace (for Enterprise)
    pub namespace: Option<String>,
    /// KV v2 mount path
    #[serde(alias = "mountpath")]
    #[validate(length(min = 1, message = "Vault mount path cannot be empty"))]
    pub mount_path: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self { address: None, token: None, namespace: None, mount_path: "secret".to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatadogSettings {
    /// Wrap secret store calls in tracing spans
    #[serde(default)]
    pub tracing: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

fn template_error(template: &str, expected: usize) -> std::result::Result<(), ValidationError> {
    validate_template(template, expected).map_err(|e| {
        let mut err = ValidationError::new("format");
        err.message = Some(e.to_string().into());
        err
    })
}

fn validate_prefix_fmt(template: &str) -> std::result::Result<(), ValidationError> {
    template_error(template, 2)
}

fn validate_key_fmt(template: &str) -> std::result::Result<(), ValidationError> {
    template_error(template, 1)
}
