//! Dispatch Module
//!
//! Cache-aware dispatch over a host dispatcher and the capability handed to
//! action handlers.

mod capability;
mod dispatcher;
mod interceptor;
mod options;

pub use capability::{CacheScope, StoreCache};
pub use dispatcher::{dispatcher_fn, DispatchFuture, Dispatcher, FnDispatcher};
pub use interceptor::{ActionCache, WeakActionCache};
pub use options::{Action, DispatchOptions};
