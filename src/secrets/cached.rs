//! Caching decorator for string secrets.
//!
//! Cuts round trips to remote secret stores for hot secrets (database
//! passwords, signing keys). Values are held in an
//! [`InMemoryCache<String>`](crate::cache::InMemoryCache) keyed by the fully
//! qualified id, so `get_secret("db-pwd")` and
//! `get_secret_verbatim("svc/dev1/db-pwd")` share one entry. Binary secrets
//! are never cached.
//!
//! After rotating a secret call [`CachedSecretsManager::invalidate`] or wait
//! out the TTL.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{Cache, InMemoryCache};
use crate::context::Context;

use super::error::{Result, SecretsError};
use super::manager::SecretsManager;
use super::naming::SecretNaming;

/// Name of the backing cache, as it appears in log fields.
pub const CACHE_NAME: &str = "secrets";

pub struct CachedSecretsManager<M> {
    inner: M,
    naming: SecretNaming,
    cache: InMemoryCache<String>,
}

impl<M: SecretsManager> CachedSecretsManager<M> {
    /// Wrap `inner`, caching string secrets for `ttl`.
    ///
    /// `naming` must match the naming `inner` uses for named lookups.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::ConfigError`] if `ttl` is zero
    pub fn new(inner: M, naming: SecretNaming, ttl: Duration) -> Result<Self> {
        let cache = InMemoryCache::new(CACHE_NAME, ttl)
            .map_err(|e| SecretsError::config_error(format!("Invalid secrets cache: {}", e)))?;
        Ok(Self { inner, naming, cache })
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Drop the cached value for a qualified id.
    pub fn invalidate(&self, id: &str) {
        if self.cache.remove(id).is_ok() {
            debug!(secret_id = %id, "Invalidated cached secret");
        }
    }

    /// Drop every cached secret.
    pub fn clear(&self) {
        let count = self.cache.clear();
        info!(count = count, "Cleared secrets cache");
    }

    /// Number of cached secrets, including expired ones not yet swept.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    async fn through_cache(&self, ctx: &Context, id: &str) -> Result<String> {
        if let Some(e) = ctx.err() {
            return Err(SecretsError::Cancelled(e));
        }

        match self.cache.get(id) {
            Ok(value) => {
                info!(secret_id = %id, cache = CACHE_NAME, "Retrieving secret (cached)");
                return Ok(value);
            }
            Err(e) if e.is_not_found() => debug!(secret_id = %id, "Cache miss, fetching from backend"),
            Err(e) => warn!(secret_id = %id, error = %e, "Secrets cache read failed, fetching from backend"),
        }

        let value = self.inner.get_secret_verbatim(ctx, id).await?;
        if let Err(e) = self.cache.set(id, &value) {
            warn!(secret_id = %id, error = %e, "Failed to cache secret");
        }
        Ok(value)
    }
}

#[async_trait]
impl<M: SecretsManager> SecretsManager for CachedSecretsManager<M> {
    async fn get_secret(&self, ctx: &Context, name: &str) -> Result<String> {
        let id = self.naming.qualify(name)?;
        self.through_cache(ctx, &id).await
    }

    async fn get_secret_verbatim(&self, ctx: &Context, id: &str) -> Result<String> {
        self.through_cache(ctx, id).await
    }

    async fn get_binary_secret(&self, ctx: &Context, id: &str) -> Result<Vec<u8>> {
        self.inner.get_binary_secret(ctx, id).await
    }
}
