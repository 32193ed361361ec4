//! Cached Action Handlers
//!
//! Wraps an action handler so it runs with a cache capability in its
//! context, letting it dispatch other actions through the cache.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::dispatch::{ActionCache, CacheScope, DispatchFuture, DispatchOptions, Dispatcher};

/// Execution context handed to a cached action handler.
pub struct ActionContext<D: Dispatcher> {
    /// Cache capability, defaulting to the wrapper's timeout
    pub cache: CacheScope<D>,
}

type Handler<D> = Arc<
    dyn Fn(
            ActionContext<D>,
            Option<Value>,
        ) -> DispatchFuture<<D as Dispatcher>::Output, <D as Dispatcher>::Error>
        + Send
        + Sync,
>;

// == Cached Action ==
/// An action handler bundled with its cache options. Built by [`cache_action`].
pub struct CachedAction<D: Dispatcher> {
    handler: Handler<D>,
    timeout: Option<u64>,
}

impl<D: Dispatcher> Clone for CachedAction<D> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            timeout: self.timeout,
        }
    }
}

/// Wraps `handler` so that, when called, it receives a [`CacheScope`] whose
/// dispatches use `options.timeout` as their default TTL.
pub fn cache_action<D, F, Fut>(handler: F, options: DispatchOptions) -> CachedAction<D>
where
    D: Dispatcher,
    F: Fn(ActionContext<D>, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<D::Output, D::Error>> + Send + 'static,
{
    CachedAction {
        handler: Arc::new(move |ctx: ActionContext<D>, payload: Option<Value>| {
            handler(ctx, payload).boxed()
        }),
        timeout: options.timeout,
    }
}

impl<D: Dispatcher> CachedAction<D> {
    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// Runs the handler against `cache`.
    pub fn call(
        &self,
        cache: &ActionCache<D>,
        payload: Option<Value>,
    ) -> DispatchFuture<D::Output, D::Error> {
        let ctx = ActionContext {
            cache: CacheScope::new(cache.clone(), self.timeout),
        };
        (self.handler)(ctx, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::dispatch::StoreCache;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct UserDispatcher {
        calls: Arc<AtomicUsize>,
    }

    impl Dispatcher for UserDispatcher {
        type Output = Value;
        type Error = String;

        fn dispatch(&self, _action: &str, payload: Option<Value>) -> DispatchFuture<Value, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let id = payload
                    .as_ref()
                    .and_then(|p| p["id"].as_u64())
                    .ok_or_else(|| "no id".to_string())?;
                Ok::<_, String>(json!({"id": id, "name": format!("user-{}", id)}))
            }
            .boxed()
        }
    }

    fn user_cache() -> (ActionCache<UserDispatcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = UserDispatcher {
            calls: Arc::clone(&calls),
        };
        (ActionCache::new(dispatcher, CacheConfig::default()), calls)
    }

    #[tokio::test]
    async fn test_handler_dispatches_through_cache() {
        let (cache, calls) = user_cache();

        let load_pair = cache_action(
            |ctx: ActionContext<UserDispatcher>, payload: Option<Value>| async move {
                let options = DispatchOptions::new();
                let first = ctx.cache.dispatch("fetchUser", payload.clone(), options).await?;
                let again = ctx.cache.dispatch("fetchUser", payload, options).await?;
                Ok::<_, String>(json!([first, again]))
            },
            DispatchOptions::new(),
        );

        let result = load_pair.call(&cache, Some(json!({"id": 3}))).await.unwrap();

        assert_eq!(result[0], result[1]);
        assert_eq!(result[0]["name"], "user-3");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let (cache, _calls) = user_cache();

        let action = cache_action(
            |ctx: ActionContext<UserDispatcher>, _payload: Option<Value>| async move {
                ctx.cache.dispatch("fetchUser", None, DispatchOptions::new()).await
            },
            DispatchOptions::new(),
        );

        assert_eq!(action.call(&cache, None).await, Err("no id".to_string()));
        assert!(!cache.has("fetchUser", None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrapper_timeout_applies_to_context() {
        let (cache, calls) = user_cache();

        let action = cache_action(
            |ctx: ActionContext<UserDispatcher>, payload: Option<Value>| async move {
                ctx.cache.dispatch("fetchUser", payload, DispatchOptions::new()).await
            },
            DispatchOptions::with_timeout(500),
        );
        assert_eq!(action.timeout(), Some(500));

        action.call(&cache, Some(json!({"id": 1}))).await.unwrap();
        tokio::time::advance(Duration::from_millis(499)).await;
        action.call(&cache, Some(json!({"id": 1}))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        action.call(&cache, Some(json!({"id": 1}))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
