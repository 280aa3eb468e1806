//! Bounded In-Process Cache Module
//!
//! HashMap storage with LRU eviction under a fixed capacity and lazy TTL
//! expiration. All state sits behind one mutex so every operation is atomic.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::entry::expiration_for;
use crate::cache::{CacheEntry, CacheStats, CacheStore, LruTracker, Statistics};
use crate::clock::{system_clock, Clock};
use crate::error::{CacheError, Result};

// == Bounded Cache ==
/// Capacity-limited in-process cache.
///
/// Expired entries are not removed by reads; they stay visible to
/// `get_entry` and keep counting toward `size` until they are evicted,
/// overwritten, deleted or purged with [`BoundedCache::purge_expired`].
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_objects: usize,
    default_lifetime: i64,
    clock: Arc<dyn Clock>,
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    lru: LruTracker<K>,
    stats: CacheStats,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Inserts an entry, evicting the least recently used key first when a
    /// new key would exceed `max_objects`.
    fn insert(&mut self, key: K, entry: CacheEntry<V>, max_objects: usize) {
        if !self.entries.contains_key(&key) && self.entries.len() >= max_objects {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(capacity = max_objects, "evicted least recently used entry");
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    /// Returns a fresh value, recording the hit or miss.
    fn lookup(&mut self, key: &K, now: i64) -> Option<V>
    where
        V: Clone,
    {
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Some(entry.value().clone()),
            _ => None,
        };

        match value {
            Some(value) => {
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn remove(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
        }
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `max_objects` entries.
    ///
    /// # Arguments
    /// * `max_objects` - Capacity; zero is rejected
    /// * `default_lifetime` - Lifetime in milliseconds used by `put`
    pub fn new(max_objects: usize, default_lifetime: i64) -> Result<Self> {
        Self::with_clock(max_objects, default_lifetime, system_clock())
    }

    /// Same as [`BoundedCache::new`] with an injected clock.
    pub fn with_clock(
        max_objects: usize,
        default_lifetime: i64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if max_objects == 0 {
            return Err(CacheError::InvalidCapacity(max_objects));
        }

        debug!(max_objects, default_lifetime, "bounded cache created");

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            max_objects,
            default_lifetime,
            clock,
        })
    }

    pub fn capacity(&self) -> usize {
        self.max_objects
    }

    // == Get Or Load ==
    /// Returns the fresh value for `key`, or runs `loader` on a miss and
    /// caches what it produces for the default lifetime.
    ///
    /// The loader runs without holding the cache lock, so two callers
    /// missing on the same key may both load. Loader errors are returned
    /// unchanged and nothing is cached.
    pub fn get_or_load<F, E>(&self, key: K, loader: F) -> std::result::Result<V, E>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
    {
        let now = self.clock.now_millis();
        if let Some(value) = self.inner.lock().lookup(&key, now) {
            return Ok(value);
        }

        let value = loader(&key)?;

        let expiration = expiration_for(self.clock.now_millis(), self.default_lifetime);
        let mut inner = self.inner.lock();
        inner.stats.record_load();
        inner.insert(key, CacheEntry::new(value.clone(), expiration), self.max_objects);
        Ok(value)
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }

        if !expired.is_empty() {
            debug!(removed = expired.len(), "purged expired entries");
        }
        expired.len()
    }

    // == Describe Entry ==
    /// Renders the stored entry for `key`, expired or not.
    pub fn describe_entry(&self, key: &K) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        let now = self.clock.now_millis();
        let inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) => format!("Key {:?}\n{}", key, entry.report_at(now)),
            None => format!("Key {:?} not in cache", key),
        }
    }
}

impl<K, V> CacheStore<K, V> for BoundedCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Result<Option<V>> {
        let now = self.clock.now_millis();
        Ok(self.inner.lock().lookup(key, now))
    }

    fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let mut found = HashMap::new();
        for key in keys {
            if let Some(value) = inner.lookup(key, now) {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn get_entry(&self, key: &K) -> Result<Option<CacheEntry<V>>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get(key).cloned();
        if entry.is_some() {
            inner.lru.touch(key);
        }
        Ok(entry)
    }

    fn put_with_lifetime(&self, key: K, value: V, lifetime_ms: i64) -> Result<()> {
        let expiration = expiration_for(self.clock.now_millis(), lifetime_ms);
        self.inner
            .lock()
            .insert(key, CacheEntry::new(value, expiration), self.max_objects);
        Ok(())
    }

    fn put_all_with_lifetime(&self, entries: HashMap<K, V>, lifetime_ms: i64) -> Result<()> {
        let expiration = expiration_for(self.clock.now_millis(), lifetime_ms);
        let mut inner = self.inner.lock();
        for (key, value) in entries {
            inner.insert(key, CacheEntry::new(value, expiration), self.max_objects);
        }
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<()> {
        self.inner.lock().remove(key);
        Ok(())
    }

    fn delete_all(&self, keys: &[K]) -> Result<()> {
        let mut inner = self.inner.lock();
        for key in keys {
            inner.remove(key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.inner.lock().entries.len() as u64)
    }

    fn statistics(&self) -> Result<Statistics> {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        Ok(Statistics::InProcess(stats))
    }

    fn default_lifetime(&self) -> i64 {
        self.default_lifetime
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("max_objects", &self.max_objects)
            .field("default_lifetime", &self.default_lifetime)
            .field("size", &self.inner.lock().entries.len())
            .finish()
    }
}
