//! Background Tasks Module
//!
//! # Tasks
//! - Expired entry sweep: removes expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_configured_cleanup};
