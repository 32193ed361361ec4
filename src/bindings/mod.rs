//! Bindings Module
//!
//! Helpers exposing the cached dispatch to action handlers and UI callers.

mod action;
mod mapper;

pub use action::{cache_action, ActionContext, CachedAction};
pub use mapper::{map_cache_actions, ActionBinding, ActionCaller, ActionMap, BoundDispatch};
