//! AWS Secrets Manager store (feature `aws`).
//!
//! Uses `GetSecretValue`; string lookups read `SecretString`, binary lookups
//! read `SecretBinary`. Credentials and region come from the standard AWS
//! provider chain unless overridden in [`AwsStoreConfig`].

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::Client;
use std::fmt;
use tracing::info;

use super::error::{Result, SecretsError};
use super::store::{SecretBackendType, SecretStore};

/// Overrides applied on top of the shared AWS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsStoreConfig {
    pub region: Option<String>,
    /// Custom endpoint, e.g. LocalStack.
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct AwsSecretStore {
    client: Client,
}

impl fmt::Debug for AwsSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSecretStore").field("client", &"[SecretsManagerClient]").finish()
    }
}

impl AwsSecretStore {
    /// Load the shared AWS configuration and build a client.
    pub async fn new(config: &AwsStoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&shared_config);
        if let Some(endpoint) = config.endpoint.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }

        info!(region = ?config.region, endpoint = ?config.endpoint, "Initialized AWS Secrets Manager store");
        Self { client: Client::from_conf(builder.build()) }
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, id: &str) -> Result<aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueOutput> {
        self.client.get_secret_value().secret_id(id).send().await.map_err(|err| map_sdk_error(id, err))
    }
}

fn map_sdk_error<E>(id: &str, err: SdkError<E>) -> SecretsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(context) => match context.err().code() {
            Some("ResourceNotFoundException") => SecretsError::not_found(id),
            Some("AccessDeniedException") | Some("UnrecognizedClientException") => {
                SecretsError::authentication_failed(format!("AWS denied access to '{}': {}", id, err))
            }
            _ => SecretsError::backend_error(format!("GetSecretValue failed for '{}': {}", id, err)),
        },
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            SecretsError::connection_failed(format!("GetSecretValue failed for '{}': {}", id, err))
        }
        _ => SecretsError::backend_error(format!("GetSecretValue failed for '{}': {}", id, err)),
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret_string(&self, id: &str) -> Result<String> {
        let output = self.fetch(id).await?;
        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretsError::invalid_value(format!("Secret '{}' has no string value", id)))
    }

    async fn get_secret_binary(&self, id: &str) -> Result<Vec<u8>> {
        let output = self.fetch(id).await?;
        output
            .secret_binary()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| SecretsError::invalid_value(format!("Secret '{}' has no binary value", id)))
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::AwsSecretsManager
    }
}
