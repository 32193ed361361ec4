//! Action Callers
//!
//! Turns a list or map of action names into ready-made callers, each running
//! the cached dispatch. Useful for binding actions to UI component methods.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::dispatch::{ActionCache, DispatchFuture, DispatchOptions, Dispatcher};

type CallerFn<D> = Arc<
    dyn Fn(
            BoundDispatch<D>,
            Option<Value>,
            DispatchOptions,
        ) -> DispatchFuture<<D as Dispatcher>::Output, <D as Dispatcher>::Error>
        + Send
        + Sync,
>;

// == Bound Dispatch ==
/// Cached dispatch that prefixes action types with a namespace.
pub struct BoundDispatch<D: Dispatcher> {
    cache: ActionCache<D>,
    namespace: String,
}

impl<D: Dispatcher> Clone for BoundDispatch<D> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl<D: Dispatcher> BoundDispatch<D> {
    /// Full action type for `action` in this namespace.
    pub fn qualify(&self, action: &str) -> String {
        format!("{}{}", self.namespace, action)
    }

    pub async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> Result<D::Output, D::Error> {
        self.cache
            .dispatch(&self.qualify(action), payload, options)
            .await
    }

    pub fn cache(&self) -> &ActionCache<D> {
        &self.cache
    }
}

// == Bindings ==
/// What a mapped caller runs: a (namespaced) action, or custom code given
/// the namespaced cached dispatch.
pub enum ActionBinding<D: Dispatcher> {
    Action(String),
    Caller(CallerFn<D>),
}

impl<D: Dispatcher> ActionBinding<D> {
    pub fn action(name: impl Into<String>) -> Self {
        ActionBinding::Action(name.into())
    }

    pub fn caller<F, Fut>(f: F) -> Self
    where
        F: Fn(BoundDispatch<D>, Option<Value>, DispatchOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D::Output, D::Error>> + Send + 'static,
    {
        ActionBinding::Caller(Arc::new(
            move |dispatch: BoundDispatch<D>, payload: Option<Value>, options: DispatchOptions| {
                f(dispatch, payload, options).boxed()
            },
        ))
    }
}

impl<D: Dispatcher> From<&str> for ActionBinding<D> {
    fn from(name: &str) -> Self {
        ActionBinding::action(name)
    }
}

impl<D: Dispatcher> From<String> for ActionBinding<D> {
    fn from(name: String) -> Self {
        ActionBinding::Action(name)
    }
}

/// Actions to map: plain names, or caller names bound to actions or code.
pub enum ActionMap<D: Dispatcher> {
    Names(Vec<String>),
    Bindings(Vec<(String, ActionBinding<D>)>),
}

impl<D: Dispatcher> From<Vec<&str>> for ActionMap<D> {
    fn from(names: Vec<&str>) -> Self {
        ActionMap::Names(names.into_iter().map(String::from).collect())
    }
}

impl<D: Dispatcher> From<Vec<String>> for ActionMap<D> {
    fn from(names: Vec<String>) -> Self {
        ActionMap::Names(names)
    }
}

impl<D: Dispatcher> From<Vec<(&str, &str)>> for ActionMap<D> {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        ActionMap::Bindings(
            pairs
                .into_iter()
                .map(|(name, action)| (name.to_string(), ActionBinding::action(action)))
                .collect(),
        )
    }
}

impl<D: Dispatcher> From<Vec<(String, ActionBinding<D>)>> for ActionMap<D> {
    fn from(bindings: Vec<(String, ActionBinding<D>)>) -> Self {
        ActionMap::Bindings(bindings)
    }
}

// == Action Caller ==
/// A named entry point running one binding through the cache.
pub struct ActionCaller<D: Dispatcher> {
    dispatch: BoundDispatch<D>,
    binding: ActionBinding<D>,
}

impl<D: Dispatcher> ActionCaller<D> {
    /// Fully qualified action type, or None for a custom caller.
    pub fn action_type(&self) -> Option<String> {
        match &self.binding {
            ActionBinding::Action(name) => Some(self.dispatch.qualify(name)),
            ActionBinding::Caller(_) => None,
        }
    }

    pub fn call(
        &self,
        payload: Option<Value>,
        options: DispatchOptions,
    ) -> DispatchFuture<D::Output, D::Error> {
        match &self.binding {
            ActionBinding::Action(name) => {
                let cache = self.dispatch.cache.clone();
                let action = self.dispatch.qualify(name);
                async move { cache.dispatch(&action, payload, options).await }.boxed()
            }
            ActionBinding::Caller(f) => f(self.dispatch.clone(), payload, options),
        }
    }
}

// == Map Cache Actions ==
/// Builds one caller per mapped action.
///
/// With a namespace, action types become `namespace/name`; a trailing `/` on
/// the namespace is optional. Callers are keyed by their local name.
pub fn map_cache_actions<D: Dispatcher>(
    cache: &ActionCache<D>,
    namespace: Option<&str>,
    actions: impl Into<ActionMap<D>>,
) -> BTreeMap<String, ActionCaller<D>> {
    let dispatch = BoundDispatch {
        cache: cache.clone(),
        namespace: normalize_namespace(namespace),
    };

    let bindings: Vec<(String, ActionBinding<D>)> = match actions.into() {
        ActionMap::Names(names) => names
            .into_iter()
            .map(|name| (name.clone(), ActionBinding::Action(name)))
            .collect(),
        ActionMap::Bindings(bindings) => bindings,
    };

    bindings
        .into_iter()
        .map(|(name, binding)| {
            let caller = ActionCaller {
                dispatch: dispatch.clone(),
                binding,
            };
            (name, caller)
        })
        .collect()
}

fn normalize_namespace(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !ns.ends_with('/') => format!("{}/", ns),
        Some(ns) => ns.to_string(),
        None => String::new(),
    }
}
