//! Secrets manager contract and its namespacing implementation.

use async_trait::async_trait;
use std::future::Future;
use tracing::{error, info, Instrument};

use crate::context::Context;

use super::error::{Result, SecretsError};
use super::naming::SecretNaming;
use super::store::SecretStore;

/// Application-facing secrets lookup.
///
/// Every call takes the caller's [`Context`]; a cancelled or expired context
/// aborts the lookup with [`SecretsError::Cancelled`].
#[async_trait]
pub trait SecretsManager: Send + Sync {
    /// String secret `name`, namespaced by application and environment.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if the store has no such secret
    /// - [`SecretsError::Cancelled`] if `ctx` is done first
    async fn get_secret(&self, ctx: &Context, name: &str) -> Result<String>;

    /// String secret stored under the already qualified `id`.
    async fn get_secret_verbatim(&self, ctx: &Context, id: &str) -> Result<String>;

    /// Binary secret stored under the namespace prefix followed directly by
    /// `id`. See [`SecretNaming::binary_id`].
    async fn get_binary_secret(&self, ctx: &Context, id: &str) -> Result<Vec<u8>>;
}

/// [`SecretsManager`] that qualifies names with a [`SecretNaming`] and reads
/// from a [`SecretStore`].
///
/// # Example
///
/// ```
/// use servicekit::context::Context;
/// use servicekit::secrets::{InMemorySecretStore, NamespacedSecretsManager, SecretNaming, SecretsManager};
///
/// # tokio_test::block_on(async {
/// let store = InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2");
/// let naming = SecretNaming::with_defaults("svc", "dev1").unwrap();
/// let manager = NamespacedSecretsManager::new(store, naming);
///
/// let ctx = Context::background();
/// assert_eq!(manager.get_secret(&ctx, "db-pwd").await.unwrap(), "hunter2");
/// # });
/// ```
#[derive(Debug)]
pub struct NamespacedSecretsManager<S> {
    store: S,
    naming: SecretNaming,
    tracing_enabled: bool,
}

impl<S: SecretStore> NamespacedSecretsManager<S> {
    pub fn new(store: S, naming: SecretNaming) -> Self {
        Self { store, naming, tracing_enabled: false }
    }

    /// Run each store call inside a `secrets_store` span.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    pub fn naming(&self) -> &SecretNaming {
        &self.naming
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Binary secret addressed like [`get_secret`](SecretsManager::get_secret),
    /// as `<prefix>/<key>`.
    pub async fn get_binary_secret_by_name(&self, ctx: &Context, name: &str) -> Result<Vec<u8>> {
        let id = self.naming.qualify(name)?;
        self.lookup(ctx, &id, "get_secret_binary", self.store.get_secret_binary(&id)).await
    }

    async fn lookup<T, F>(&self, ctx: &Context, id: &str, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let backend = self.store.backend_type();
        info!(secret_id = %id, backend = %backend, "Looking up secret");

        let outcome = if self.tracing_enabled {
            let span = crate::secrets_span!(backend, id, operation);
            ctx.run(call.instrument(span)).await
        } else {
            ctx.run(call).await
        };

        let result = outcome.unwrap_or_else(|e| Err(SecretsError::Cancelled(e)));
        if let Err(ref e) = result {
            error!(secret_id = %id, backend = %backend, error = %e, "Secret lookup failed");
        }
        result
    }
}

#[async_trait]
impl<S: SecretStore> SecretsManager for NamespacedSecretsManager<S> {
    async fn get_secret(&self, ctx: &Context, name: &str) -> Result<String> {
        let id = self.naming.qualify(name)?;
        self.get_secret_verbatim(ctx, &id).await
    }

    async fn get_secret_verbatim(&self, ctx: &Context, id: &str) -> Result<String> {
        self.lookup(ctx, id, "get_secret_string", self.store.get_secret_string(id)).await
    }

    async fn get_binary_secret(&self, ctx: &Context, id: &str) -> Result<Vec<u8>> {
        let id = self.naming.binary_id(id);
        self.lookup(ctx, &id, "get_secret_binary", self.store.get_secret_binary(&id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextError;
    use crate::secrets::naming::DEFAULT_PREFIX_FMT;
    use crate::secrets::store::InMemorySecretStore;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn manager(store: InMemorySecretStore) -> NamespacedSecretsManager<InMemorySecretStore> {
        NamespacedSecretsManager::new(store, SecretNaming::with_defaults("svc", "dev1").unwrap())
    }

    #[tokio::test]
    async fn test_get_secret_qualifies_name() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
        let ctx = Context::background();

        assert_eq!(m.get_secret(&ctx, "db-pwd").await.unwrap(), "hunter2");
        assert_eq!(m.store().requested_ids(), vec!["svc/dev1/db-pwd"]);
    }

    #[tokio::test]
    async fn test_custom_key_format() {
        let naming = SecretNaming::new("svc", "dev1", DEFAULT_PREFIX_FMT, "k_%s").unwrap();
        let m = NamespacedSecretsManager::new(InMemorySecretStore::new().with_secret("svc/dev1/k_x", "v"), naming);

        assert_eq!(m.get_secret(&Context::background(), "x").await.unwrap(), "v");
        assert_eq!(m.store().requested_ids(), vec!["svc/dev1/k_x"]);
    }

    #[tokio::test]
    async fn test_verbatim_id_is_not_rewritten() {
        let m = manager(InMemorySecretStore::new().with_secret("other/prod/token", "t"));
        assert_eq!(m.get_secret_verbatim(&Context::background(), "other/prod/token").await.unwrap(), "t");
        assert_eq!(m.store().requested_ids(), vec!["other/prod/token"]);
    }

    #[tokio::test]
    async fn test_binary_secret_id_concatenates_prefix() {
        let m = manager(InMemorySecretStore::new().with_binary("svc/dev1cert", vec![1u8, 2, 3]));
        assert_eq!(m.get_binary_secret(&Context::background(), "cert").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(m.store().requested_ids(), vec!["svc/dev1cert"]);
    }

    #[tokio::test]
    async fn test_binary_secret_by_name() {
        let m = manager(InMemorySecretStore::new().with_binary("svc/dev1/cert", vec![9u8]));
        assert_eq!(m.get_binary_secret_by_name(&Context::background(), "cert").await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_store_errors_are_returned_verbatim() {
        let m = manager(InMemorySecretStore::new());
        let err = m.get_secret(&Context::background(), "missing").await.unwrap_err();
        assert!(matches!(err, SecretsError::NotFound { ref key } if key == "svc/dev1/missing"));
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_before_store_call() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/a", "1"));
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let err = m.get_secret(&ctx, "a").await.unwrap_err();
        assert!(matches!(err, SecretsError::Cancelled(ContextError::Canceled)));
        assert!(m.store().requested_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_slow_lookup() {
        let store = InMemorySecretStore::new().with_secret("svc/dev1/a", "1").with_latency(Duration::from_secs(5));
        let m = manager(store);
        let (ctx, _cancel) = Context::background().with_timeout(Duration::from_secs(1));

        let err = m.get_secret(&ctx, "a").await.unwrap_err();
        assert!(matches!(err, SecretsError::Cancelled(ContextError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancel_during_lookup() {
        let store = InMemorySecretStore::new().with_secret("svc/dev1/a", "1").with_latency(Duration::from_secs(30));
        let m = manager(store);
        let (ctx, cancel) = Context::background().with_cancel();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let err = m.get_secret(&ctx, "a").await.unwrap_err();
        assert!(matches!(err, SecretsError::Cancelled(ContextError::Canceled)));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_detached_context_ignores_parent_cancellation() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/a", "1"));
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let detached = crate::context::detach(&ctx);
        assert_eq!(m.get_secret(&detached, "a").await.unwrap(), "1");
    }

    #[traced_test]
    #[tokio::test]
    async fn test_lookup_logs_secret_id_not_value() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/db-pwd", "hunter2"));
        m.get_secret(&Context::background(), "db-pwd").await.unwrap();

        assert!(logs_contain("Looking up secret"));
        assert!(logs_contain("svc/dev1/db-pwd"));
        assert!(!logs_contain("hunter2"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_no_span_by_default() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/a", "1"));
        m.get_secret(&Context::background(), "a").await.unwrap();
        assert!(logs_contain("In-memory secret lookup"));
        assert!(!logs_contain("secrets_store"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_failures_are_logged() {
        let m = manager(InMemorySecretStore::new());
        let _ = m.get_secret(&Context::background(), "gone").await;
        assert!(logs_contain("Secret lookup failed"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_tracing_span_when_enabled() {
        let m = manager(InMemorySecretStore::new().with_secret("svc/dev1/a", "1")).with_tracing(true);
        m.get_secret(&Context::background(), "a").await.unwrap();
        assert!(logs_contain("secrets_store"));
        assert!(logs_contain("In-memory secret lookup"));
    }
}
