//! Typed value caches.
//!
//! [`Cache<T>`] is the contract services depend on; [`InMemoryCache<T>`] is
//! the process-local implementation. Values are serialised on `set` and
//! deserialised on `get`, so a cache stores owned snapshots and never hands
//! out references into shared state.
//!
//! A miss (absent or expired key) is reported as
//! [`CacheError::EntryNotFound`]:
//!
//! ```
//! use servicekit::cache::{Cache, CacheError, InMemoryCache};
//! use std::time::Duration;
//!
//! let cache = InMemoryCache::<String>::new("users", Duration::from_secs(300)).unwrap();
//! match cache.get("user:42") {
//!     Ok(name) => println!("cached {}", name),
//!     Err(e) if e.is_not_found() => { /* load and cache */ }
//!     Err(e) => panic!("cache failure: {}", e),
//! }
//! ```

pub mod codec;
pub mod error;
pub mod memory;
pub mod store;

pub use error::{CacheError, Result};
pub use memory::{CacheOptions, InMemoryCache};
pub use store::{ShardedStore, StoreOptions};

/// Typed key-value cache with per-entry expiry.
///
/// Implementations are safe to share between threads. Operations never
/// perform I/O.
pub trait Cache<T>: Send + Sync {
    /// Decoded value stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::EntryNotFound`] if the key is absent or expired
    /// - [`CacheError::Decode`] if the stored bytes do not decode as `T`
    fn get(&self, key: &str) -> Result<T>;

    /// Store `value` under `key`, resetting the entry's expiry.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Encode`] if `value` cannot be encoded
    fn set(&self, key: &str, value: &T) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}
