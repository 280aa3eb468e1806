//! Cache Statistics Module
//!
//! Per-backend statistics snapshots. Numbers from different backends
//! describe different things and are not meant to be compared.

use serde::Serialize;

// == Statistics ==
/// Statistics snapshot returned by `CacheStore::statistics`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Statistics {
    InProcess(CacheStats),
    Remote(RemoteStats),
}

impl Statistics {
    /// Hit rate when the backend can report one.
    pub fn hit_rate(&self) -> Option<f64> {
        match self {
            Statistics::InProcess(stats) => Some(stats.hit_rate()),
            Statistics::Remote(stats) => stats.hit_rate(),
        }
    }
}

// == Cache Stats ==
/// Counters kept by the bounded in-process backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups answered with a fresh value
    pub hits: u64,
    /// Number of lookups for absent or expired keys
    pub misses: u64,
    /// Number of entries removed to stay within capacity
    pub evictions: u64,
    /// Number of values produced by a loader after a miss
    pub loads: u64,
    /// Current number of retained entries
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 1.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_load(&mut self) {
        self.loads += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Remote Stats ==
/// Server report fetched from the remote store (`INFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteStats {
    /// Raw `key:value` report as sent by the server
    pub info: String,
}

impl RemoteStats {
    pub fn new(info: String) -> Self {
        Self { info }
    }

    /// Looks up one `name:value` field of the report.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.info
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.trim())
    }

    pub fn keyspace_hits(&self) -> Option<u64> {
        self.field("keyspace_hits")?.parse().ok()
    }

    pub fn keyspace_misses(&self) -> Option<u64> {
        self.field("keyspace_misses")?.parse().ok()
    }

    /// Server-wide keyspace hit rate, when the report carries the counters.
    pub fn hit_rate(&self) -> Option<f64> {
        let hits = self.keyspace_hits()?;
        let misses = self.keyspace_misses()?;
        let total = hits + misses;
        if total == 0 {
            Some(1.0)
        } else {
            Some(hits as f64 / total as f64)
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = "# Server\r\nredis_version:7.2.4\r\n\r\n# Stats\r\nkeyspace_hits:30\r\nkeyspace_misses:10\r\nevicted_keys:0\r\n";

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.loads, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_eviction_and_load() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_eviction();
        stats.record_load();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.loads, 1);
    }

    #[test]
    fn test_remote_field_lookup() {
        let stats = RemoteStats::new(INFO.to_string());

        assert_eq!(stats.field("redis_version"), Some("7.2.4"));
        assert_eq!(stats.field("evicted_keys"), Some("0"));
        assert_eq!(stats.field("missing"), None);
    }

    #[test]
    fn test_remote_hit_rate() {
        let stats = RemoteStats::new(INFO.to_string());

        assert_eq!(stats.keyspace_hits(), Some(30));
        assert_eq!(stats.keyspace_misses(), Some(10));
        assert_eq!(stats.hit_rate(), Some(0.75));
    }

    #[test]
    fn test_remote_hit_rate_without_counters() {
        let stats = RemoteStats::new("# Server\r\nredis_version:7.2.4\r\n".to_string());
        assert_eq!(stats.hit_rate(), None);
    }

    #[test]
    fn test_statistics_serializes_with_backend_tag() {
        let stats = Statistics::InProcess(CacheStats::new());
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["backend"], "in_process");
        assert_eq!(json["hits"], 0);
    }
}
