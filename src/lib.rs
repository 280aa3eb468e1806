//! Lifecache - time-bounded caching with pluggable backends
//!
//! Provides a cache contract with a bounded in-process backend and a remote
//! key-value backend, plus an interception layer that puts a cache in front
//! of any service interface through a declarative per-method rule table.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod intercept;

pub use cache::{BoundedCache, CacheEntry, CacheStore, RemoteCache, Statistics};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use intercept::{CacheOperation, CacheRules, Interceptor, MethodCacheRule};
