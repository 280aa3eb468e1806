//! Cache Rule Module
//!
//! Declarative per-method cache behavior, fixed when a wrapper is built.

use std::collections::HashMap;

use serde::Serialize;

// == Cache Operation ==
/// How the interceptor treats one method of the wrapped interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOperation {
    /// Serve from cache when possible, read through on a miss
    Get,
    /// Populate the cache after the delegate's write succeeds
    Put,
    /// Invalidate the cache after the delegate's delete succeeds
    Delete,
    /// Pass straight through to the delegate
    #[default]
    Ignore,
}

// == Method Cache Rule ==
/// Cache behavior declared for one method.
///
/// `key_param_index` names the argument that supplies the cache key for
/// `Get`, or the value to cache for `Put`. `Delete` takes its key from the
/// delegate's result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodCacheRule {
    pub operation: CacheOperation,
    pub key_param_index: usize,
    /// Lifetime for entries this method writes; the store default when unset
    pub lifetime_ms: Option<i64>,
}

impl MethodCacheRule {
    pub const fn new(operation: CacheOperation, key_param_index: usize) -> Self {
        Self {
            operation,
            key_param_index,
            lifetime_ms: None,
        }
    }

    pub const fn get(key_param_index: usize) -> Self {
        Self::new(CacheOperation::Get, key_param_index)
    }

    pub const fn put(key_param_index: usize) -> Self {
        Self::new(CacheOperation::Put, key_param_index)
    }

    pub const fn delete(key_param_index: usize) -> Self {
        Self::new(CacheOperation::Delete, key_param_index)
    }

    pub const fn ignore() -> Self {
        Self::new(CacheOperation::Ignore, 0)
    }

    /// Overrides the lifetime of entries written on behalf of this method.
    pub const fn with_lifetime(mut self, lifetime_ms: i64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }
}

// == Cache Rules ==
/// Table mapping method names to their cache rule.
///
/// Methods without an entry are treated as [`CacheOperation::Ignore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRules {
    rules: HashMap<&'static str, MethodCacheRule>,
}

impl CacheRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the rule for `method`, replacing any earlier declaration.
    pub fn with(mut self, method: &'static str, rule: MethodCacheRule) -> Self {
        self.rules.insert(method, rule);
        self
    }

    /// Returns the rule for `method`, `Ignore` when undeclared.
    pub fn rule_for(&self, method: &str) -> MethodCacheRule {
        self.rules.get(method).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<(&'static str, MethodCacheRule)> for CacheRules {
    fn from_iter<I: IntoIterator<Item = (&'static str, MethodCacheRule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
