//! Action Cache - result caching for store action dispatch
//!
//! Repeated dispatches of the same action with the same payload return the
//! earlier result until its TTL runs out, and concurrent identical dispatches
//! share a single underlying call.

pub mod bindings;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod tasks;

pub use bindings::{cache_action, map_cache_actions};
pub use config::CacheConfig;
pub use dispatch::{
    dispatcher_fn, Action, ActionCache, DispatchOptions, Dispatcher, StoreCache, WeakActionCache,
};
pub use error::CacheError;
pub use tasks::spawn_cleanup_task;
