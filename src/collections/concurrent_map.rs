//! Typed concurrent map with single-flight construction on misses.
//!
//! Reads go straight to a [`DashMap`] (sharded, per-shard read locks, no
//! global lock). [`ConcurrentMap::load_or_store`] uses double-checked
//! acquisition of one map-wide generator lock, so for any key the generator
//! runs at most once between two "absent" observations.
//!
//! The generator lock is shared by all keys: generators for different keys
//! are serialised too. Keep generators short.

use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

pub struct ConcurrentMap<K, V> {
    entries: DashMap<K, V>,
    generator_lock: Mutex<()>,
}

impl<K, V> Default for ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { entries: DashMap::new(), generator_lock: Mutex::new(()) }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap").field("len", &self.entries.len()).finish()
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite.
    pub fn store(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn load(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Return the value for `key`, running `generator` to produce it when
    /// absent.
    ///
    /// Concurrent callers for the same missing key block until the first one
    /// has stored its value, then return that value without running their own
    /// generator.
    pub fn load_or_store<F>(&self, key: K, generator: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.load(&key) {
            return value;
        }

        let _guard = self.lock_generators();
        if let Some(value) = self.load(&key) {
            return value;
        }

        let value = generator(&key);
        self.entries.insert(key, value.clone());
        value
    }

    /// Like [`load_or_store`](Self::load_or_store) with a fallible generator.
    /// Nothing is stored when the generator fails.
    pub fn try_load_or_store<F, E>(&self, key: K, generator: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(value) = self.load(&key) {
            return Ok(value);
        }

        let _guard = self.lock_generators();
        if let Some(value) = self.load(&key) {
            return Ok(value);
        }

        let value = generator(&key)?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn delete(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot of the keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot of the values, in no particular order.
    pub fn values(&self) -> Vec<V> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Visit a snapshot of the entries until `visitor` returns `false`.
    ///
    /// The visitor runs without any shard lock held, so it may freely call
    /// back into the map; such writes are not reflected in the snapshot.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let snapshot: Vec<(K, V)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, value) in &snapshot {
            if !visitor(key, value) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lock_generators(&self) -> MutexGuard<'_, ()> {
        // the guard protects no data, so a panicking generator leaves nothing torn
        self.generator_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
