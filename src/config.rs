//! Configuration Module
//!
//! Loads cache configuration from environment variables and builds the
//! configured backend.

use std::env;
use std::hash::Hash;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cache::{BoundedCache, CacheStore, RemoteCache};
use crate::error::{CacheError, Result};

// == Backend Kind ==
/// Which backend [`Config::open_store`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    InProcess,
    Remote,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-process" | "in_process" | "memory" => Ok(BackendKind::InProcess),
            "remote" | "redis" => Ok(BackendKind::Remote),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown cache backend '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendKind,
    /// Capacity of the in-process backend
    pub max_objects: usize,
    /// Lifetime in milliseconds applied by `put` without an explicit lifetime
    pub default_lifetime_ms: i64,
    pub remote_host: String,
    pub remote_port: u16,
    /// Connect/read/write timeout of the remote backend in milliseconds
    pub remote_timeout_ms: u64,
    /// Logical database selected after connecting
    pub remote_db: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `in-process` or `remote` (default: in-process)
    /// - `CACHE_MAX_OBJECTS` - In-process capacity (default: 1000)
    /// - `CACHE_DEFAULT_LIFETIME_MS` - Default lifetime (default: 300000)
    /// - `CACHE_REMOTE_HOST` - Remote host (default: 127.0.0.1)
    /// - `CACHE_REMOTE_PORT` - Remote port (default: 6379)
    /// - `CACHE_REMOTE_TIMEOUT_MS` - Remote timeout (default: 2000)
    /// - `CACHE_REMOTE_DB` - Remote database index (default: 0)
    ///
    /// Unparseable numbers fall back to their default; an unknown backend
    /// name is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("CACHE_BACKEND") {
            Some(name) => name.parse::<BackendKind>()?,
            None => defaults.backend,
        };

        Ok(Self {
            backend,
            max_objects: parse_var(&lookup, "CACHE_MAX_OBJECTS").unwrap_or(defaults.max_objects),
            default_lifetime_ms: parse_var(&lookup, "CACHE_DEFAULT_LIFETIME_MS")
                .unwrap_or(defaults.default_lifetime_ms),
            remote_host: lookup("CACHE_REMOTE_HOST").unwrap_or(defaults.remote_host),
            remote_port: parse_var(&lookup, "CACHE_REMOTE_PORT").unwrap_or(defaults.remote_port),
            remote_timeout_ms: parse_var(&lookup, "CACHE_REMOTE_TIMEOUT_MS")
                .unwrap_or(defaults.remote_timeout_ms),
            remote_db: parse_var(&lookup, "CACHE_REMOTE_DB").unwrap_or(defaults.remote_db),
        })
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    // == Open Store ==
    /// Builds the configured backend.
    ///
    /// The remote backend connects immediately and selects `remote_db`.
    pub fn open_store<K, V>(&self) -> Result<Box<dyn CacheStore<K, V>>>
    where
        K: Eq + Hash + Clone + Send + Serialize + 'static,
        V: Clone + Send + Serialize + DeserializeOwned + 'static,
    {
        match self.backend {
            BackendKind::InProcess => {
                let store =
                    BoundedCache::<K, V>::new(self.max_objects, self.default_lifetime_ms)?;
                info!(max_objects = self.max_objects, "using in-process cache");
                Ok(Box::new(store))
            }
            BackendKind::Remote => {
                let store: RemoteCache<K, V> = RemoteCache::connect(
                    &self.remote_host,
                    self.remote_port,
                    self.remote_timeout(),
                    self.default_lifetime_ms,
                )?;
                if self.remote_db != 0 {
                    store.select(self.remote_db)?;
                }
                info!(host = %self.remote_host, port = self.remote_port, "using remote cache");
                Ok(Box::new(store))
            }
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::InProcess,
            max_objects: 1000,
            default_lifetime_ms: 300_000,
            remote_host: "127.0.0.1".to_string(),
            remote_port: 6379,
            remote_timeout_ms: 2_000,
            remote_db: 0,
        }
    }
}
