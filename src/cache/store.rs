//! Cache Store Module
//!
//! The contract every cache backend implements.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::{CacheEntry, Statistics};
use crate::error::Result;

// == Cache Store ==
/// Time-bounded key/value cache.
///
/// Every backend shares these semantics:
/// - `get` and `get_all` only ever return fresh values; `get_entry` returns
///   the stored entry even once it has expired so callers can revalidate it.
/// - Absent keys are not errors. Deleting one is a no-op.
/// - `size` counts retained entries, including expired ones the backend has
///   not purged yet.
/// - Batch puts stamp every entry with one expiration computed before the
///   first insert. Batches are not transactional.
///
/// Implementations must be safe to share between threads. Errors are only
/// returned for transport failures of a remote backend.
pub trait CacheStore<K, V>: Send + Sync
where
    K: Eq + Hash,
{
    /// Returns the value for `key` if present and unexpired.
    fn get(&self, key: &K) -> Result<Option<V>>;

    /// Returns the fresh values among `keys`; missing or expired keys are omitted.
    fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>>;

    /// Returns the raw entry for `key`, possibly expired.
    fn get_entry(&self, key: &K) -> Result<Option<CacheEntry<V>>>;

    /// Stores `value` for `lifetime_ms`, replacing any existing entry.
    ///
    /// A non-positive lifetime stores the entry already stale: `get` will not
    /// serve it but `get_entry` will.
    fn put_with_lifetime(&self, key: K, value: V, lifetime_ms: i64) -> Result<()>;

    /// Stores every pair for `lifetime_ms`, all sharing one expiration instant.
    fn put_all_with_lifetime(&self, entries: HashMap<K, V>, lifetime_ms: i64) -> Result<()>;

    fn delete(&self, key: &K) -> Result<()>;

    fn delete_all(&self, keys: &[K]) -> Result<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Removes every entry. Statistics are left untouched.
    fn clear(&self) -> Result<()>;

    fn size(&self) -> Result<u64>;

    fn statistics(&self) -> Result<Statistics>;

    /// Lifetime applied by `put` and `put_all`, fixed at construction.
    fn default_lifetime(&self) -> i64;

    // == Default Lifetime Variants ==
    fn put(&self, key: K, value: V) -> Result<()> {
        self.put_with_lifetime(key, value, self.default_lifetime())
    }

    fn put_all(&self, entries: HashMap<K, V>) -> Result<()> {
        self.put_all_with_lifetime(entries, self.default_lifetime())
    }
}
