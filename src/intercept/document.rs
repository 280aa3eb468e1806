//! Document Store Module
//!
//! A document-database interface and its caching wrapper. The wrapper
//! forwards every method to the delegate through an [`Interceptor`], one
//! forwarding method per interface method.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::intercept::{Argument, CacheRules, Cacheable, Interceptor, MethodCacheRule};

/// Method names used as keys of the document rule table.
pub mod methods {
    pub const FIND: &str = "find";
    pub const FIND_ANY: &str = "find_any";
    pub const CONTAINS: &str = "contains";
    pub const SAVE: &str = "save";
    pub const UPDATE: &str = "update";
    pub const REMOVE: &str = "remove";
}

// == Models ==
/// A JSON document with its identifier and revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Document {
    pub fn new(id: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            rev: None,
            body,
        }
    }
}

/// Acknowledgement of a write or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    /// Identifier of the document written or removed
    pub id: String,
    pub rev: String,
}

impl Cacheable<Document> for WriteResponse {
    fn identifying_key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

// == Document Store ==
/// Operations of a document database.
pub trait DocumentStore {
    type Error;

    /// Fetches a document by id; `None` when it does not exist.
    fn find(&self, id: &str) -> std::result::Result<Option<Document>, Self::Error>;

    /// Fetches a document by full URI.
    fn find_any(&self, uri: &str) -> std::result::Result<Option<Document>, Self::Error>;

    fn contains(&self, id: &str) -> std::result::Result<bool, Self::Error>;

    /// Creates a document.
    fn save(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error>;

    /// Writes a new revision of an existing document.
    fn update(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error>;

    fn remove(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error>;
}

/// Rule table for [`DocumentStore`]: reads are cached, writes populate,
/// removals invalidate.
pub fn document_rules() -> CacheRules {
    CacheRules::new()
        .with(methods::FIND, MethodCacheRule::get(0))
        .with(methods::FIND_ANY, MethodCacheRule::get(0))
        .with(methods::SAVE, MethodCacheRule::put(0))
        .with(methods::UPDATE, MethodCacheRule::put(0))
        .with(methods::REMOVE, MethodCacheRule::delete(0))
}

// == Cached Document Store ==
/// [`DocumentStore`] wrapper that caches documents by id.
pub struct CachedDocumentStore<D> {
    inner: D,
    interceptor: Interceptor<Document>,
}

impl<D: DocumentStore> CachedDocumentStore<D> {
    /// Wraps `inner` using [`document_rules`].
    pub fn new(inner: D, cache: Arc<dyn CacheStore<String, Document>>) -> Self {
        Self::with_rules(inner, cache, document_rules())
    }

    pub fn with_rules(
        inner: D,
        cache: Arc<dyn CacheStore<String, Document>>,
        rules: CacheRules,
    ) -> Self {
        Self {
            inner,
            interceptor: Interceptor::new(cache, rules),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore<String, Document>> {
        self.interceptor.cache()
    }

    // == Direct Cache Access ==
    pub fn cache_get(&self, id: &str) -> Result<Option<Document>> {
        self.cache().get(&id.to_string())
    }

    /// Caches `doc` under `id` without touching the database.
    pub fn cache_put(&self, id: &str, doc: Document, lifetime_ms: i64) -> Result<()> {
        self.cache().put_with_lifetime(id.to_string(), doc, lifetime_ms)
    }

    pub fn cache_delete(&self, id: &str) -> Result<()> {
        self.cache().delete(&id.to_string())
    }

    pub fn cache_clear(&self) -> Result<()> {
        self.cache().clear()
    }
}

impl<D: DocumentStore> DocumentStore for CachedDocumentStore<D> {
    type Error = D::Error;

    fn find(&self, id: &str) -> std::result::Result<Option<Document>, Self::Error> {
        self.interceptor
            .intercept(methods::FIND, &[Argument::Key(id)], || self.inner.find(id))
    }

    fn find_any(&self, uri: &str) -> std::result::Result<Option<Document>, Self::Error> {
        self.interceptor
            .intercept(methods::FIND_ANY, &[Argument::Key(uri)], || {
                self.inner.find_any(uri)
            })
    }

    /// Answers from cache when the document is cached, otherwise asks the
    /// delegate.
    fn contains(&self, id: &str) -> std::result::Result<bool, Self::Error> {
        match self.cache_get(id) {
            Ok(Some(_)) => return Ok(true),
            Ok(None) => {}
            Err(err) => warn!(id, error = %err, "cache lookup failed, asking delegate"),
        }

        self.interceptor
            .intercept(methods::CONTAINS, &[Argument::Key(id)], || {
                self.inner.contains(id)
            })
    }

    fn save(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error> {
        self.interceptor
            .intercept(methods::SAVE, &[Argument::Value(doc)], || self.inner.save(doc))
    }

    fn update(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error> {
        self.interceptor
            .intercept(methods::UPDATE, &[Argument::Value(doc)], || {
                self.inner.update(doc)
            })
    }

    fn remove(&self, doc: &Document) -> std::result::Result<WriteResponse, Self::Error> {
        self.interceptor
            .intercept(methods::REMOVE, &[Argument::Value(doc)], || {
                self.inner.remove(doc)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_rule_table() {
        let rules = document_rules();

        assert_eq!(rules.len(), 5);
        assert_eq!(rules.rule_for(methods::FIND), MethodCacheRule::get(0));
        assert_eq!(rules.rule_for(methods::UPDATE), MethodCacheRule::put(0));
        assert_eq!(rules.rule_for(methods::REMOVE), MethodCacheRule::delete(0));
        assert_eq!(rules.rule_for(methods::CONTAINS), MethodCacheRule::ignore());
    }

    #[test]
    fn test_write_response_identifies_document() {
        let response = WriteResponse {
            id: "doc1".to_string(),
            rev: "1-abc".to_string(),
        };

        assert_eq!(
            Cacheable::<Document>::identifying_key(&response),
            Some("doc1".to_string())
        );
        assert!(<WriteResponse as Cacheable<Document>>::from_cached(Document::new(
            "doc1",
            json!({})
        ))
        .is_none());
    }

    #[test]
    fn test_document_serde_skips_missing_rev() {
        let doc = Document::new("doc1", json!({"shape": "rectangle", "length": 5}));
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json, json!({"id": "doc1", "body": {"shape": "rectangle", "length": 5}}));

        let back: Document = serde_json::from_value(json!({"id": "doc2"})).unwrap();
        assert_eq!(back.rev, None);
        assert_eq!(back.body, serde_json::Value::Null);
    }
}
