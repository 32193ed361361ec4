//! Cached Dispatch
//!
//! [`ActionCache`] wraps a host [`Dispatcher`]. A dispatch whose key has a
//! fresh resolved entry returns the stored value; one whose key has an entry
//! in flight awaits that same future; anything else starts the underlying
//! dispatch and registers it before the first await, so at most one
//! underlying dispatch per key is ever in flight.
//!
//! Failed dispatches are removed from the store and their error returned
//! unchanged. When no key can be derived the call goes straight to the
//! dispatcher.
//!
//! The shared future finalizes its own entry once it settles. Whichever
//! caller happens to drive it to completion does the bookkeeping, so a caller
//! dropped mid-flight never strands a pending entry: the next caller joining
//! the key picks the dispatch up where it stopped.

use std::sync::{Arc, Weak};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{derive_key, timeout, CacheKey, CacheStats, CacheStore, EntryId, EntryState};
use crate::config::CacheConfig;
use crate::dispatch::{Action, DispatchFuture, DispatchOptions, Dispatcher};

type DispatchResult<D> = Result<<D as Dispatcher>::Output, <D as Dispatcher>::Error>;

// == Action Cache ==
/// Cache-aware dispatch in front of a host dispatcher.
///
/// Cloning yields another handle to the same cache.
pub struct ActionCache<D: Dispatcher> {
    inner: Arc<Inner<D>>,
}

struct Inner<D: Dispatcher> {
    dispatcher: D,
    config: CacheConfig,
    store: RwLock<CacheStore<D::Output, D::Error>>,
}

impl<D: Dispatcher> Clone for ActionCache<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// == Weak Handle ==
/// Non-owning handle to an [`ActionCache`].
///
/// A dispatcher that routes some of its actions back through the cache (for
/// example to a [`CachedAction`](crate::bindings::CachedAction)) holds this
/// instead of the cache itself, so the two do not keep each other alive.
pub struct WeakActionCache<D: Dispatcher> {
    inner: Weak<Inner<D>>,
}

impl<D: Dispatcher> Clone for WeakActionCache<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<D: Dispatcher> WeakActionCache<D> {
    /// Returns the cache if any strong handle to it is still alive.
    pub fn upgrade(&self) -> Option<ActionCache<D>> {
        self.inner.upgrade().map(|inner| ActionCache { inner })
    }
}

impl<D: Dispatcher> ActionCache<D> {
    /// Creates an empty cache in front of `dispatcher`.
    pub fn new(dispatcher: D, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                config,
                store: RwLock::new(CacheStore::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.inner.dispatcher
    }

    /// Creates a handle that does not keep the cache alive.
    pub fn downgrade(&self) -> WeakActionCache<D> {
        WeakActionCache {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // == Dispatch ==
    /// Dispatches `action` through the cache.
    ///
    /// Behaves like the host dispatch except that a repeated call within the
    /// TTL of a previous success returns that success again.
    pub async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> DispatchResult<D> {
        self.dispatch_with_defaults(action, payload, options.timeout, None)
            .await
    }

    /// Dispatches an object-style action.
    pub async fn dispatch_action(
        &self,
        action: Action,
        options: DispatchOptions,
    ) -> DispatchResult<D> {
        let call_timeout = action.call_timeout(&options);
        let (action_type, payload) = action.into_parts();
        self.dispatch_with_defaults(&action_type, Some(payload), call_timeout, None)
            .await
    }

    /// Dispatch where `fallback_timeout` replaces the configured global default.
    pub(crate) async fn dispatch_with_defaults(
        &self,
        action: &str,
        payload: Option<Value>,
        call_timeout: Option<u64>,
        fallback_timeout: Option<u64>,
    ) -> DispatchResult<D> {
        let key = match derive_key(action, payload.as_ref()) {
            Ok(key) => key,
            Err(err) => {
                warn!(action, error = %err, "Cache key derivation failed, dispatching uncached");
                self.inner.store.write().await.stats_mut().record_bypass();
                return self.inner.dispatcher.dispatch(action, payload).await;
            }
        };

        let ttl = timeout::resolve(
            call_timeout,
            self.inner.config.action_timeout(action),
            fallback_timeout.or(self.inner.config.timeout),
        );

        let shared = {
            let mut store = self.inner.store.write().await;
            let existing = store.get(&key).map(|entry| entry.state.clone());

            match existing {
                Some(EntryState::Resolved(value)) => {
                    store.stats_mut().record_hit();
                    debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Some(EntryState::Pending(shared)) => {
                    store.stats_mut().record_coalesced();
                    debug!(key = %key, "Joining in-flight dispatch");
                    shared
                }
                None => {
                    store.stats_mut().record_miss();
                    debug!(key = %key, ttl_ms = ?ttl, "Cache miss, dispatching");

                    let id = store.next_entry_id();
                    let underlying = self.inner.dispatcher.dispatch(action, payload);
                    let weak = Arc::downgrade(&self.inner);
                    let shared = settle(weak, key.clone(), id, ttl, underlying)
                        .boxed()
                        .shared();
                    store.set_pending(key, id, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    // == Queries ==
    /// True iff a fresh resolved entry exists for the call. Pending entries
    /// do not count. Never mutates the cache.
    pub async fn has(&self, action: &str, payload: Option<&Value>) -> bool {
        let Ok(key) = derive_key(action, payload) else {
            return false;
        };
        self.inner.store.read().await.get_value(&key).is_some()
    }

    pub async fn has_action(&self, action: &Action) -> bool {
        self.has(action.action_type(), Some(action.payload())).await
    }

    // == Invalidation ==
    /// Removes every entry. Returns true iff the cache held a live entry.
    pub async fn clear(&self) -> bool {
        let cleared = self.inner.store.write().await.clear_all();
        debug!(cleared, "Cache cleared");
        cleared
    }

    /// Removes every entry of one action type, returning how many.
    pub async fn clear_type(&self, action: &str) -> usize {
        let removed = self.inner.store.write().await.clear_by_type(action);
        debug!(action, removed, "Cache cleared for action type");
        removed
    }

    /// Removes the entry for one call. Returns true iff it was present.
    pub async fn delete(&self, action: &str, payload: Option<&Value>) -> bool {
        let Ok(key) = derive_key(action, payload) else {
            return false;
        };
        self.inner.store.write().await.delete(&key)
    }

    pub async fn delete_action(&self, action: &Action) -> bool {
        self.delete(action.action_type(), Some(action.payload()))
            .await
    }

    // == Maintenance ==
    /// Physically removes expired entries. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.store.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.store.read().await.stats()
    }

    /// Number of stored entries, pending and not-yet-swept ones included.
    pub async fn len(&self) -> usize {
        self.inner.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.store.read().await.is_empty()
    }
}

// == Settle ==
/// Awaits the underlying dispatch, then resolves or drops the pending entry.
///
/// Holds the cache weakly: an in-flight dispatch must not keep a dropped
/// cache alive through the entry that stores it.
async fn settle<D: Dispatcher>(
    cache: Weak<Inner<D>>,
    key: CacheKey,
    id: EntryId,
    ttl: Option<u64>,
    underlying: DispatchFuture<D::Output, D::Error>,
) -> DispatchResult<D> {
    let outcome = underlying.await;

    let Some(inner) = cache.upgrade() else {
        return outcome;
    };
    let mut store = inner.store.write().await;

    match &outcome {
        Ok(value) => {
            if store.resolve_pending(&key, id, value.clone(), ttl) {
                debug!(key = %key, ttl_ms = ?ttl, "Dispatch resolved, result cached");
            }
        }
        Err(_) => {
            store.stats_mut().record_failure();
            if store.discard_pending(&key, id) {
                debug!(key = %key, "Dispatch failed, entry dropped");
            }
        }
    }

    outcome
}
