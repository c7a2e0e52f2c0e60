//! In-memory [`Cache`] implementation.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::codec;
use super::error::{CacheError, Result};
use super::store::{ShardedStore, StoreOptions};
use super::Cache;

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Construction options for [`InMemoryCache::with_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub store: StoreOptions,
}

impl CacheOptions {
    /// Defaults for `ttl`: 16 shards, unbounded, swept once per TTL (at least
    /// hourly).
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: StoreOptions {
                sweep_interval: Some(ttl.min(MAX_SWEEP_INTERVAL)),
                ..StoreOptions::default()
            },
        }
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.store.shards = shards;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.store.max_entries = Some(max_entries);
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.store.sweep_interval = interval;
        self
    }
}

/// Typed cache over a [`ShardedStore`].
///
/// # Example
///
/// ```
/// use servicekit::cache::{Cache, InMemoryCache};
/// use std::time::Duration;
///
/// let cache = InMemoryCache::<i64>::new("t", Duration::from_secs(60)).unwrap();
/// cache.set("a", &7).unwrap();
/// assert_eq!(cache.get("a").unwrap(), 7);
///
/// cache.remove("a").unwrap();
/// assert!(cache.get("a").unwrap_err().is_not_found());
/// ```
pub struct InMemoryCache<T> {
    name: String,
    store: Arc<ShardedStore>,
    _value: PhantomData<fn() -> T>,
}

impl<T> InMemoryCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a cache named `name` whose entries live for `ttl`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidTtl`] if `ttl` is zero
    pub fn new(name: impl Into<String>, ttl: Duration) -> Result<Self> {
        Self::with_options(name, CacheOptions::new(ttl))
    }

    /// Create a cache with explicit shard and eviction settings.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidTtl`] if `options.ttl` is zero
    /// - [`CacheError::Backend`] if the store options are invalid
    pub fn with_options(name: impl Into<String>, options: CacheOptions) -> Result<Self> {
        let name = name.into();
        if options.ttl.is_zero() {
            return Err(CacheError::InvalidTtl { cache: name });
        }

        let store = ShardedStore::new(options.ttl, &options.store).map_err(|e| {
            CacheError::backend(format!("Failed to create store for cache '{}': {}", name, e))
        })?;

        debug!(
            cache = %name,
            ttl = ?options.ttl,
            shards = options.store.shards,
            "Created in-memory cache"
        );

        Ok(Self { name, store, _value: PhantomData })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.store.ttl()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.store.clear();
        debug!(cache = %self.name, removed = removed, "Cleared cache");
        removed
    }

    /// Drop expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.store.sweep()
    }

    fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::invalid_key("key cannot be empty"));
        }
        Ok(())
    }
}

impl<T> Cache<T> for InMemoryCache<T>
where
    T: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Result<T> {
        Self::check_key(key)?;
        match self.store.get(key) {
            Some(bytes) => {
                debug!(cache = %self.name, key = %key, "Cache hit");
                codec::decode(key, &bytes)
            }
            None => {
                debug!(cache = %self.name, key = %key, "Cache miss");
                Err(CacheError::entry_not_found(key))
            }
        }
    }

    fn set(&self, key: &str, value: &T) -> Result<()> {
        Self::check_key(key)?;
        let bytes = codec::encode(key, value)?;
        self.store.set(key, bytes);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        self.store.remove(key);
        Ok(())
    }
}

impl<T> fmt::Debug for InMemoryCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("name", &self.name)
            .field("ttl", &self.store.ttl())
            .field("len", &self.store.len())
            .finish()
    }
}
