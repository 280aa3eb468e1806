//! Remote Cache Module
//!
//! Cache backend living in a networked key-value store. Keys and entries
//! cross the wire as opaque byte strings produced by the codec; every
//! logical operation is one request/response round trip.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::entry::expiration_for;
use crate::cache::{codec, CacheEntry, CacheStore, RemoteStats, Statistics};
use crate::clock::{system_clock, Clock};
use crate::error::{CacheError, Result};

// == Wire Contract ==
/// Byte-level operations the remote store must offer.
///
/// Each method is exactly one round trip. Failures are transport failures
/// and are never retried.
pub trait KvConnection: Send {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    fn del(&mut self, key: &[u8]) -> Result<()>;
    /// Removes every key of the selected database.
    fn flush_db(&mut self) -> Result<()>;
    /// Removes every key of every database on the server.
    fn flush_all(&mut self) -> Result<()>;
    /// Number of keys in the selected database.
    fn db_size(&mut self) -> Result<u64>;
    /// Free-form server report.
    fn info(&mut self) -> Result<String>;
    fn select(&mut self, db: i64) -> Result<()>;
}

impl KvConnection for redis::Connection {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(redis::cmd("GET").arg(key).query(self)?)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Ok(redis::cmd("SET").arg(key).arg(value).query(self)?)
    }

    fn del(&mut self, key: &[u8]) -> Result<()> {
        let _removed: i64 = redis::cmd("DEL").arg(key).query(self)?;
        Ok(())
    }

    fn flush_db(&mut self) -> Result<()> {
        Ok(redis::cmd("FLUSHDB").query(self)?)
    }

    fn flush_all(&mut self) -> Result<()> {
        Ok(redis::cmd("FLUSHALL").query(self)?)
    }

    fn db_size(&mut self) -> Result<u64> {
        Ok(redis::cmd("DBSIZE").query(self)?)
    }

    fn info(&mut self) -> Result<String> {
        Ok(redis::cmd("INFO").query(self)?)
    }

    fn select(&mut self, db: i64) -> Result<()> {
        Ok(redis::cmd("SELECT").arg(db).query(self)?)
    }
}

// == Remote Cache ==
/// Cache whose entries live in a remote key-value store.
///
/// The connection is owned by the cache and released when the cache is
/// dropped or [`RemoteCache::close`]d. Requests from concurrent callers are
/// serialized over that single connection.
pub struct RemoteCache<K, V, C = redis::Connection> {
    conn: Mutex<C>,
    default_lifetime: i64,
    clock: Arc<dyn Clock>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> RemoteCache<K, V, redis::Connection> {
    // == Connect ==
    /// Opens a Redis connection to `host:port`.
    ///
    /// `timeout` bounds connecting as well as every later read and write;
    /// a request exceeding it fails with [`CacheError::Timeout`].
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        default_lifetime: i64,
    ) -> Result<Self> {
        if timeout.is_zero() {
            return Err(CacheError::InvalidConfig(
                "remote timeout must be greater than zero".to_string(),
            ));
        }

        let client = redis::Client::open(format!("redis://{}:{}/", host, port))?;
        let conn = client.get_connection_with_timeout(timeout)?;
        conn.set_read_timeout(Some(timeout))?;
        conn.set_write_timeout(Some(timeout))?;

        info!(host, port, timeout_ms = timeout.as_millis() as u64, "connected to remote cache");
        Ok(Self::from_connection(conn, default_lifetime))
    }
}

impl<K, V, C: KvConnection> RemoteCache<K, V, C> {
    /// Adopts an already-open connection.
    pub fn from_connection(conn: C, default_lifetime: i64) -> Self {
        Self::with_clock(conn, default_lifetime, system_clock())
    }

    pub fn with_clock(conn: C, default_lifetime: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(conn),
            default_lifetime,
            clock,
            _marker: PhantomData,
        }
    }

    /// Switches the connection to logical database `db`.
    pub fn select(&self, db: i64) -> Result<()> {
        self.conn.lock().select(db)
    }

    /// Empties every database on the server, not just the selected one.
    pub fn flush_all(&self) -> Result<()> {
        self.conn.lock().flush_all()
    }

    /// Releases the connection.
    pub fn close(self) {
        info!("closing remote cache connection");
        drop(self.into_connection());
    }

    /// Takes the connection back out of the cache.
    pub fn into_connection(self) -> C {
        self.conn.into_inner()
    }
}

impl<K, V, C> RemoteCache<K, V, C>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
    C: KvConnection,
{
    /// Encodes a key; failures are logged and reported as `None`.
    fn key_bytes(&self, key: &K) -> Option<Vec<u8>> {
        match codec::encode(key) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(error = %err, "failed to encode cache key");
                None
            }
        }
    }

    fn fetch_entry(&self, conn: &mut C, key: &K) -> Result<Option<CacheEntry<V>>> {
        let Some(key_bytes) = self.key_bytes(key) else {
            return Ok(None);
        };
        let Some(raw) = conn.get(&key_bytes)? else {
            return Ok(None);
        };

        match codec::decode(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(err) => {
                warn!(error = %err, "failed to decode cached entry, treating as miss");
                Ok(None)
            }
        }
    }

    fn store_entry(&self, conn: &mut C, key: &K, entry: &CacheEntry<V>) -> Result<()> {
        let Some(key_bytes) = self.key_bytes(key) else {
            return Ok(());
        };
        let entry_bytes = match codec::encode(entry) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to encode cache entry, write dropped");
                return Ok(());
            }
        };

        conn.set(&key_bytes, &entry_bytes)
    }

    // == Describe Entry ==
    /// Renders the stored entry for `key`, expired or not.
    pub fn describe_entry(&self, key: &K) -> Result<String>
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        let now = self.clock.now_millis();
        let entry = self.fetch_entry(&mut self.conn.lock(), key)?;
        Ok(match entry {
            Some(entry) => format!("Key {:?}\n{}", key, entry.report_at(now)),
            None => format!("Key {:?} not in cache", key),
        })
    }
}

impl<K, V, C> CacheStore<K, V> for RemoteCache<K, V, C>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize + DeserializeOwned,
    C: KvConnection,
{
    fn get(&self, key: &K) -> Result<Option<V>> {
        let now = self.clock.now_millis();
        let entry = self.fetch_entry(&mut self.conn.lock(), key)?;
        Ok(entry
            .filter(|entry| !entry.is_expired_at(now))
            .map(CacheEntry::into_value))
    }

    fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>> {
        let now = self.clock.now_millis();
        let mut conn = self.conn.lock();

        let mut found = HashMap::new();
        for key in keys {
            if let Some(entry) = self.fetch_entry(&mut conn, key)? {
                if !entry.is_expired_at(now) {
                    found.insert(key.clone(), entry.into_value());
                }
            }
        }
        Ok(found)
    }

    fn get_entry(&self, key: &K) -> Result<Option<CacheEntry<V>>> {
        self.fetch_entry(&mut self.conn.lock(), key)
    }

    fn put_with_lifetime(&self, key: K, value: V, lifetime_ms: i64) -> Result<()> {
        let entry = CacheEntry::new(value, expiration_for(self.clock.now_millis(), lifetime_ms));
        self.store_entry(&mut self.conn.lock(), &key, &entry)
    }

    fn put_all_with_lifetime(&self, entries: HashMap<K, V>, lifetime_ms: i64) -> Result<()> {
        let expiration = expiration_for(self.clock.now_millis(), lifetime_ms);
        let mut conn = self.conn.lock();
        for (key, value) in entries {
            self.store_entry(&mut conn, &key, &CacheEntry::new(value, expiration))?;
        }
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<()> {
        match self.key_bytes(key) {
            Some(key_bytes) => self.conn.lock().del(&key_bytes),
            None => Ok(()),
        }
    }

    fn clear(&self) -> Result<()> {
        self.conn.lock().flush_db()
    }

    fn size(&self) -> Result<u64> {
        self.conn.lock().db_size()
    }

    fn statistics(&self) -> Result<Statistics> {
        let info = self.conn.lock().info()?;
        Ok(Statistics::Remote(RemoteStats::new(info)))
    }

    fn default_lifetime(&self) -> i64 {
        self.default_lifetime
    }
}

impl<K, V, C> fmt::Debug for RemoteCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCache")
            .field("default_lifetime", &self.default_lifetime)
            .finish_non_exhaustive()
    }
}
