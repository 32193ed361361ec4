//! Cache Capability
//!
//! The operations an action handler may use on the cache, as a trait so
//! handlers can be written against either the cache itself or a scope with
//! its own default timeout.

use async_trait::async_trait;
use serde_json::Value;

use crate::dispatch::{ActionCache, DispatchOptions, Dispatcher};

// == Store Cache ==
/// Cached dispatch plus invalidation.
#[async_trait]
pub trait StoreCache: Send + Sync {
    type Output;
    type Error;

    /// Dispatches through the cache.
    async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> Result<Self::Output, Self::Error>;

    /// True iff a fresh result is cached for the call.
    async fn has(&self, action: &str, payload: Option<&Value>) -> bool;

    /// Clears everything. True iff something was cached.
    async fn clear(&self) -> bool;

    /// Clears one action type. Returns the number of entries removed.
    async fn clear_type(&self, action: &str) -> usize;

    /// Removes one call's entry. True iff it was cached.
    async fn delete(&self, action: &str, payload: Option<&Value>) -> bool;
}

#[async_trait]
impl<D: Dispatcher> StoreCache for ActionCache<D> {
    type Output = D::Output;
    type Error = D::Error;

    async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> Result<D::Output, D::Error> {
        ActionCache::dispatch(self, action, payload, options).await
    }

    async fn has(&self, action: &str, payload: Option<&Value>) -> bool {
        ActionCache::has(self, action, payload).await
    }

    async fn clear(&self) -> bool {
        ActionCache::clear(self).await
    }

    async fn clear_type(&self, action: &str) -> usize {
        ActionCache::clear_type(self, action).await
    }

    async fn delete(&self, action: &str, payload: Option<&Value>) -> bool {
        ActionCache::delete(self, action, payload).await
    }
}

// == Cache Scope ==
/// A view of an [`ActionCache`] whose dispatches fall back to the scope's
/// timeout instead of the cache's global default.
///
/// Invalidation goes to the underlying cache unchanged.
pub struct CacheScope<D: Dispatcher> {
    cache: ActionCache<D>,
    timeout: Option<u64>,
}

impl<D: Dispatcher> Clone for CacheScope<D> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            timeout: self.timeout,
        }
    }
}

impl<D: Dispatcher> CacheScope<D> {
    /// Scope over `cache`. A `timeout` of None keeps the cache's own default.
    pub fn new(cache: ActionCache<D>, timeout: Option<u64>) -> Self {
        Self { cache, timeout }
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn cache(&self) -> &ActionCache<D> {
        &self.cache
    }
}

#[async_trait]
impl<D: Dispatcher> StoreCache for CacheScope<D> {
    type Output = D::Output;
    type Error = D::Error;

    async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> Result<D::Output, D::Error> {
        self.cache
            .dispatch_with_defaults(action, payload, options.timeout, self.timeout)
            .await
    }

    async fn has(&self, action: &str, payload: Option<&Value>) -> bool {
        self.cache.has(action, payload).await
    }

    async fn clear(&self) -> bool {
        self.cache.clear().await
    }

    async fn clear_type(&self, action: &str) -> usize {
        self.cache.clear_type(action).await
    }

    async fn delete(&self, action: &str, payload: Option<&Value>) -> bool {
        self.cache.delete(action, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::dispatch::dispatcher_fn;
    use serde_json::json;
    use std::time::Duration;

    fn echo_cache(
        config: CacheConfig,
    ) -> ActionCache<impl Dispatcher<Output = String, Error = String>> {
        let dispatcher = dispatcher_fn(|action: &str, payload: Option<Value>| {
            let reply = format!("{}:{}", action, payload.unwrap_or(Value::Null));
            async move { Ok::<_, String>(reply) }
        });
        ActionCache::new(dispatcher, config)
    }

    async fn use_capability<C: StoreCache>(cache: &C) -> bool {
        cache.dispatch("fetchUser", Some(json!({"id": 1})), DispatchOptions::new()).await.ok();
        cache.has("fetchUser", Some(&json!({"id": 1}))).await
    }

    #[tokio::test]
    async fn test_cache_implements_capability() {
        let cache = echo_cache(CacheConfig::default());

        assert!(use_capability(&cache).await);
        assert!(StoreCache::delete(&cache, "fetchUser", Some(&json!({"id": 1}))).await);
        assert!(!StoreCache::clear(&cache).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_timeout_replaces_global_default() {
        let cache = echo_cache(CacheConfig::new().with_timeout(10_000));
        let scope = CacheScope::new(cache.clone(), Some(100));

        assert!(use_capability(&scope).await);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!cache.has("fetchUser", Some(&json!({"id": 1}))).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_respects_action_default() {
        let cache = echo_cache(
            CacheConfig::new()
                .with_timeout(10_000)
                .with_action_timeout("fetchUser", 5_000),
        );
        let scope = CacheScope::new(cache.clone(), Some(100));

        assert!(use_capability(&scope).await);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert!(scope.has("fetchUser", Some(&json!({"id": 1}))).await);
        assert_eq!(scope.clear_type("fetchUser").await, 1);
    }
}
