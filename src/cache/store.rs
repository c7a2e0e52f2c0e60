//! Sharded, TTL-evicting byte store backing [`InMemoryCache`](super::InMemoryCache).
//!
//! Entries live in a [`DashMap`], which splits keys across independently
//! locked shards. Every entry carries its own expiry instant; expired entries
//! read as absent and are physically removed by [`ShardedStore::sweep`],
//! which a background task runs periodically when a Tokio runtime is
//! available. A TTL too large to add to the current instant never expires.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::error::{CacheError, Result};

#[derive(Debug, Clone)]
struct Entry {
    bytes: Arc<[u8]>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Eviction order: soonest expiry first, never-expiring entries last.
    fn eviction_key(&self) -> (bool, Option<Instant>) {
        (self.expires_at.is_none(), self.expires_at)
    }
}

/// Shard and eviction settings for a [`ShardedStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Number of shards; must be a power of two greater than one.
    pub shards: usize,
    /// Upper bound on live entries. `None` means unbounded.
    pub max_entries: Option<usize>,
    /// Period of the background expiry sweep. `None` disables it; expired
    /// entries are then only dropped on access or explicit sweeps.
    pub sweep_interval: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { shards: 16, max_entries: None, sweep_interval: Some(Duration::from_secs(60)) }
    }
}

#[derive(Debug)]
pub struct ShardedStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl ShardedStore {
    /// Build a store. Starts the sweeper when `options.sweep_interval` is set
    /// and a Tokio runtime is running on this thread.
    pub fn new(ttl: Duration, options: &StoreOptions) -> Result<Arc<Self>> {
        if options.shards < 2 || !options.shards.is_power_of_two() {
            return Err(CacheError::backend(format!(
                "shard count must be a power of two greater than one, got {}",
                options.shards
            )));
        }
        if options.max_entries == Some(0) {
            return Err(CacheError::backend("max_entries must be greater than zero"));
        }
        if options.sweep_interval == Some(Duration::ZERO) {
            return Err(CacheError::backend("sweep interval must be greater than zero"));
        }

        let store = Arc::new(Self {
            entries: DashMap::with_capacity_and_shard_amount(0, options.shards),
            ttl,
            max_entries: options.max_entries,
        });

        if let Some(interval) = options.sweep_interval {
            Self::spawn_sweeper(&store, interval);
        }

        Ok(store)
    }

    fn spawn_sweeper(store: &Arc<Self>, interval: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No Tokio runtime, expired cache entries are dropped on access only");
            return;
        };

        let weak: Weak<Self> = Arc::downgrade(store);
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let removed = store.sweep();
                if removed > 0 {
                    debug!(removed = removed, "Swept expired cache entries");
                }
            }
        });
    }

    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(Arc::clone(&entry.bytes));
            }
        }
        // drop it now rather than waiting for the sweeper
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    pub fn set(&self, key: &str, bytes: Vec<u8>) {
        let now = Instant::now();
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(key) && self.entries.len() >= max {
                self.make_room(max, now);
            }
        }
        let expires_at = now.checked_add(self.ttl);
        self.entries.insert(key.to_string(), Entry { bytes: bytes.into(), expires_at });
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let before = self.entries.len();
        self.entries.clear();
        before
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn make_room(&self, max: usize, now: Instant) {
        self.entries.retain(|_, entry| !entry.is_expired(now));
        while self.entries.len() >= max {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().eviction_key())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    debug!(key = %key, "Evicting cache entry closest to expiry");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
