//! Host Dispatcher
//!
//! The store's plain, uncached dispatch as seen by the cache.

use std::future::Future;
use std::marker::PhantomData;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

/// Future returned by a dispatch.
pub type DispatchFuture<T, E> = BoxFuture<'static, Result<T, E>>;

// == Dispatcher ==
/// Runs an action by type with an optional payload.
///
/// Results and errors are shared between coalesced callers, hence `Clone`.
/// Hosts whose error type is not `Clone` can wrap it in an `Arc`.
pub trait Dispatcher: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;
    type Error: Clone + Send + Sync + 'static;

    /// Starts the action. The returned future must not borrow `self`.
    fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
    ) -> DispatchFuture<Self::Output, Self::Error>;
}

// == Function Adapter ==
/// [`Dispatcher`] backed by a closure. Built with [`dispatcher_fn`].
pub struct FnDispatcher<F, T, E> {
    f: F,
    _result: PhantomData<fn() -> (T, E)>,
}

/// Wraps `f(action, payload)` as a [`Dispatcher`].
pub fn dispatcher_fn<F, Fut, T, E>(f: F) -> FnDispatcher<F, T, E>
where
    F: Fn(&str, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    FnDispatcher {
        f,
        _result: PhantomData,
    }
}

impl<F, Fut, T, E> Dispatcher for FnDispatcher<F, T, E>
where
    F: Fn(&str, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn dispatch(&self, action: &str, payload: Option<Value>) -> DispatchFuture<T, E> {
        (self.f)(action, payload).boxed()
    }
}
