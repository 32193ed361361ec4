//! Cache Module
//!
//! Key derivation, entry storage with TTL expiration and timeout resolution.

mod entry;
mod key;
mod stats;
mod store;
pub mod timeout;


// Re-export public types
pub use entry::{CacheEntry, EntryId, EntryState, SharedDispatch};
pub use key::{derive_key, derive_key_from, CacheKey};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum nesting depth of a payload used for key derivation
pub const MAX_PAYLOAD_DEPTH: usize = 64;
