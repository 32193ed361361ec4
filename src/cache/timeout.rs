//! Timeout Resolution
//!
//! Picks the effective time-to-live of a freshly resolved entry.

/// Resolves the TTL in milliseconds from the override chain.
///
/// The first value that is set wins, in this order: the per-call option, the
/// action's configured default, the global default. `None` means the entry
/// never expires on its own and stays until deleted or cleared.
pub fn resolve(
    call: Option<u64>,
    action_default: Option<u64>,
    global_default: Option<u64>,
) -> Option<u64> {
    call.or(action_default).or(global_default)
}
