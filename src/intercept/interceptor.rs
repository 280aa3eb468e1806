//! Interceptor Module
//!
//! Runs one delegate call at a time through the cache according to the
//! method's rule: short-circuit on a `Get` hit, read through on a miss,
//! populate after a `Put`, invalidate after a `Delete`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::intercept::{CacheOperation, CacheRules, MethodCacheRule};

// == Argument ==
/// One argument of an intercepted call, as far as the cache cares.
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a, V> {
    /// Identifier usable as a cache key
    Key(&'a str),
    /// Value that can be cached
    Value(&'a V),
    /// Anything else
    Other,
}

impl<'a, V> Argument<'a, V> {
    pub fn cache_key(&self) -> Option<&'a str> {
        match self {
            Argument::Key(key) => Some(*key),
            _ => None,
        }
    }

    pub fn cache_value(&self) -> Option<&'a V> {
        match self {
            Argument::Value(value) => Some(*value),
            _ => None,
        }
    }
}

// == Cacheable ==
/// Return types of intercepted methods.
///
/// The defaults describe a result the cache cannot use at all.
pub trait Cacheable<V>: Sized {
    /// Builds this return value from a cached value; `None` when this type
    /// can never be served from cache.
    fn from_cached(_value: V) -> Option<Self> {
        None
    }

    /// Value to cache after a read-through miss; `None` caches nothing.
    fn to_cached(&self) -> Option<V> {
        None
    }

    /// Key identifying what a write or delete touched.
    fn identifying_key(&self) -> Option<String> {
        None
    }
}

impl<V: Clone> Cacheable<V> for Option<V> {
    fn from_cached(value: V) -> Option<Self> {
        Some(Some(value))
    }

    fn to_cached(&self) -> Option<V> {
        self.clone()
    }
}

impl<V> Cacheable<V> for bool {}

impl<V> Cacheable<V> for () {}

// == Invocation Context ==
/// State of a single intercepted call, dropped when the call returns.
struct InvocationContext<R> {
    method: &'static str,
    rule: MethodCacheRule,
    cache_key: Option<String>,
    short_circuit: Option<R>,
}

// == Interceptor ==
/// Applies a [`CacheRules`] table around calls to an opaque delegate.
///
/// Adds no locking of its own; thread safety comes from the cache store
/// and the delegate. Cache failures are logged and never fail the call.
pub struct Interceptor<V> {
    cache: Arc<dyn CacheStore<String, V>>,
    rules: CacheRules,
}

impl<V: Clone> Interceptor<V> {
    pub fn new(cache: Arc<dyn CacheStore<String, V>>, rules: CacheRules) -> Self {
        Self { cache, rules }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore<String, V>> {
        &self.cache
    }

    pub fn rules(&self) -> &CacheRules {
        &self.rules
    }

    // == Intercept ==
    /// Runs `call` for `method` under the method's cache rule.
    ///
    /// A `Get` hit returns the cached value without running `call`. An
    /// error from `call` is returned unchanged and leaves the cache as it
    /// was.
    pub fn intercept<R, E, F>(
        &self,
        method: &'static str,
        args: &[Argument<'_, V>],
        call: F,
    ) -> Result<R, E>
    where
        R: Cacheable<V>,
        F: FnOnce() -> Result<R, E>,
    {
        let mut context = self.pre_invoke(method, args);
        if let Some(cached) = context.short_circuit.take() {
            debug!(method, "served from cache");
            return Ok(cached);
        }

        let result = call()?;
        self.post_invoke(&context, args, &result);
        Ok(result)
    }

    fn pre_invoke<R>(&self, method: &'static str, args: &[Argument<'_, V>]) -> InvocationContext<R>
    where
        R: Cacheable<V>,
    {
        let rule = self.rules.rule_for(method);
        let mut context = InvocationContext {
            method,
            rule,
            cache_key: None,
            short_circuit: None,
        };

        if rule.operation != CacheOperation::Get {
            return context;
        }

        let Some(key) = args.get(rule.key_param_index).and_then(Argument::cache_key) else {
            warn!(
                method,
                index = rule.key_param_index,
                "cache rule points at an argument without a key, bypassing cache"
            );
            return context;
        };

        match self.cache.get(&key.to_string()) {
            Ok(Some(value)) => context.short_circuit = R::from_cached(value),
            Ok(None) => debug!(method, "cache miss"),
            Err(err) => warn!(method, error = %err, "cache lookup failed, treating as miss"),
        }
        context.cache_key = Some(key.to_string());
        context
    }

    fn post_invoke<R>(&self, context: &InvocationContext<R>, args: &[Argument<'_, V>], result: &R)
    where
        R: Cacheable<V>,
    {
        let method = context.method;
        let rule = context.rule;

        match rule.operation {
            CacheOperation::Get => {
                if let (Some(key), Some(value)) = (&context.cache_key, result.to_cached()) {
                    self.store(method, rule, key.clone(), value);
                }
            }
            CacheOperation::Put => {
                let Some(id) = result.identifying_key() else {
                    return;
                };
                match args.get(rule.key_param_index).and_then(Argument::cache_value) {
                    Some(value) => self.store(method, rule, id, value.clone()),
                    None => warn!(
                        method,
                        index = rule.key_param_index,
                        "cache rule points at an argument without a value, nothing cached"
                    ),
                }
            }
            CacheOperation::Delete => {
                if let Some(id) = result.identifying_key() {
                    if let Err(err) = self.cache.delete(&id) {
                        warn!(method, error = %err, "cache invalidation failed");
                    }
                }
            }
            CacheOperation::Ignore => {}
        }
    }

    fn store(&self, method: &str, rule: MethodCacheRule, key: String, value: V) {
        let stored = match rule.lifetime_ms {
            Some(lifetime_ms) => self.cache.put_with_lifetime(key, value, lifetime_ms),
            None => self.cache.put(key, value),
        };
        if let Err(err) = stored {
            warn!(method, error = %err, "cache population failed");
        }
    }
}

impl<V> fmt::Debug for Interceptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
