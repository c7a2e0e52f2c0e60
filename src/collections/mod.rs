//! Concurrent collections.

pub mod concurrent_map;

pub use concurrent_map::ConcurrentMap;
