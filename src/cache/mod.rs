//! Cache Module
//!
//! Time-bounded caching behind one contract with two backends: a bounded
//! in-process store and a remote key-value store.

mod bounded;
pub mod codec;
mod entry;
mod lru;
mod remote;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

pub(crate) use lru::LruTracker;

// Re-export public types
pub use bounded::BoundedCache;
pub use entry::{expiration_for, CacheEntry, EntryReport};
pub use remote::{KvConnection, RemoteCache};
pub use stats::{CacheStats, RemoteStats, Statistics};
pub use store::CacheStore;
