//! Intercept Module
//!
//! Wraps a delegate so selected calls go through a cache, driven by a
//! static table of per-method rules.

pub mod document;
mod interceptor;
mod rule;

pub use document::{document_rules, CachedDocumentStore, Document, DocumentStore, WriteResponse};
pub use interceptor::{Argument, Cacheable, Interceptor};
pub use rule::{CacheOperation, CacheRules, MethodCacheRule};
