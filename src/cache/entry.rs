//! Cache Entry Module
//!
//! Defines a single cached dispatch: either still in flight or resolved with
//! an optional expiry.

use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

/// In-flight dispatch shared between every caller waiting on the same key.
pub type SharedDispatch<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Identifies one pending registration so late finalizers can tell whether
/// the entry they started is still the one in the store.
pub type EntryId = u64;

// == Entry State ==
/// What the entry currently holds.
#[derive(Clone)]
pub enum EntryState<T, E> {
    /// Underlying dispatch has not settled yet
    Pending(SharedDispatch<T, E>),
    /// Underlying dispatch succeeded with this value
    Resolved(T),
}

// == Cache Entry ==
/// Represents a single cache entry with its state and metadata.
#[derive(Clone)]
pub struct CacheEntry<T, E> {
    /// Registration id, unique within one store
    pub id: EntryId,
    /// Action type the key was derived from
    pub action: String,
    /// Pending future or resolved value
    pub state: EntryState<T, E>,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<T, E> CacheEntry<T, E> {
    // == Constructors ==
    /// Creates an in-flight entry. Pending entries never expire.
    pub fn pending(id: EntryId, action: impl Into<String>, dispatch: SharedDispatch<T, E>) -> Self {
        Self {
            id,
            action: action.into(),
            state: EntryState::Pending(dispatch),
            expires_at: None,
        }
    }

    /// Creates a resolved entry expiring `ttl_ms` milliseconds from now.
    pub fn resolved(id: EntryId, action: impl Into<String>, value: T, ttl_ms: Option<u64>) -> Self {
        Self {
            id,
            action: action.into(),
            state: EntryState::Resolved(value),
            expires_at: ttl_ms.map(|ttl| Instant::now() + Duration::from_millis(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time, so a zero TTL is stale immediately.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }

    /// True while the underlying dispatch is still in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, EntryState::Pending(_))
    }

    /// Remaining time before expiry, or None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for CacheEntry<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            EntryState::Pending(_) => "pending".to_string(),
            EntryState::Resolved(value) => format!("resolved({:?})", value),
        };
        f.debug_struct("CacheEntry")
            .field("id", &self.id)
            .field("action", &self.action)
            .field("state", &state)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
