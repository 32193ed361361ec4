//! Error types for the action cache
//!
//! Only key derivation can fail inside the cache layer. Errors raised by the
//! wrapped dispatcher are never converted into these; they reach the caller
//! exactly as the dispatcher produced them.

use thiserror::Error;

// == Cache Error Enum ==
/// Failure to derive a cache key for an action.
///
/// Every variant is non-fatal: the dispatch path reacts by bypassing the cache
/// and calling the underlying dispatcher directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The action type was an empty string
    #[error("Action type cannot be empty")]
    EmptyActionType,

    /// An object-style action carried no string `type` field
    #[error("Action object has no string `type` field")]
    MissingActionType,

    /// Payload nesting exceeded the derivation depth limit
    #[error("Payload nesting exceeds maximum depth of {0}")]
    PayloadTooDeep(usize),

    /// Payload could not be represented as a JSON value
    #[error("Payload is not serializable: {0}")]
    Unserializable(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Unserializable(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for key derivation.
pub type Result<T> = std::result::Result<T, CacheError>;
