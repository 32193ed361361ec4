//! Cache Store Module
//!
//! Maps derived keys to entries and keeps an action → keys index so a whole
//! action type can be cleared without scanning every entry.
//!
//! Expired entries are treated as absent by every read. They are physically
//! removed when touched by a write or by [`CacheStore::cleanup_expired`].

use std::collections::{HashMap, HashSet};

use crate::cache::{CacheEntry, CacheKey, CacheStats, EntryId, EntryState, SharedDispatch};

// == Cache Store ==
/// Key → entry storage with lazy TTL expiry.
pub struct CacheStore<T, E> {
    /// Entry storage
    entries: HashMap<CacheKey, CacheEntry<T, E>>,
    /// Keys per action type
    by_action: HashMap<String, HashSet<CacheKey>>,
    /// Dispatch counters
    stats: CacheStats,
    /// Next registration id
    next_id: EntryId,
}

impl<T: Clone, E> CacheStore<T, E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_action: HashMap::new(),
            stats: CacheStats::new(),
            next_id: 0,
        }
    }

    // == Get ==
    /// Returns the entry for `key` unless it is missing or expired.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry<T, E>> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    /// Returns the resolved value for `key` if it is fresh.
    pub fn get_value(&self, key: &CacheKey) -> Option<T> {
        match self.get(key).map(|entry| &entry.state) {
            Some(EntryState::Resolved(value)) => Some(value.clone()),
            _ => None,
        }
    }

    // == Set ==
    /// Stores a resolved value, replacing any existing entry for `key`.
    ///
    /// `ttl_ms` of None means the entry never expires.
    pub fn set(&mut self, key: CacheKey, value: T, ttl_ms: Option<u64>) -> EntryId {
        let id = self.next_entry_id();
        let entry = CacheEntry::resolved(id, key.action(), value, ttl_ms);
        self.insert(key, entry);
        id
    }

    // == Set Pending ==
    /// Registers an in-flight dispatch for `key` so concurrent callers can
    /// join it instead of dispatching again.
    ///
    /// `id` comes from [`CacheStore::next_entry_id`], taken before the shared
    /// future is built so the future can finalize its own registration.
    pub fn set_pending(&mut self, key: CacheKey, id: EntryId, dispatch: SharedDispatch<T, E>) {
        let entry = CacheEntry::pending(id, key.action(), dispatch);
        self.insert(key, entry);
    }

    /// Allocates a registration id, unique within this store.
    pub fn next_entry_id(&mut self) -> EntryId {
        self.next_id += 1;
        self.next_id
    }

    // == Finalize Pending ==
    /// Turns the pending entry registered as `id` into a resolved one.
    ///
    /// Returns false without touching the store if the entry was deleted,
    /// cleared or replaced since it was registered.
    pub fn resolve_pending(
        &mut self,
        key: &CacheKey,
        id: EntryId,
        value: T,
        ttl_ms: Option<u64>,
    ) -> bool {
        if !self.is_pending_registration(key, id) {
            return false;
        }
        let entry = CacheEntry::resolved(id, key.action(), value, ttl_ms);
        self.entries.insert(key.clone(), entry);
        true
    }

    /// Drops the pending entry registered as `id` after its dispatch failed.
    pub fn discard_pending(&mut self, key: &CacheKey, id: EntryId) -> bool {
        if !self.is_pending_registration(key, id) {
            return false;
        }
        self.remove(key);
        true
    }

    // == Delete ==
    /// Removes the entry for `key`.
    ///
    /// Returns true iff a live (pending or unexpired) entry was removed. A
    /// pending entry whose callers were all dropped stays live until removed
    /// here or joined by a later dispatch.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        self.remove(key).is_some_and(|entry| !entry.is_expired())
    }

    // == Clear ==
    /// Removes every entry. Returns true iff at least one live entry existed.
    pub fn clear_all(&mut self) -> bool {
        let had_live = self.entries.values().any(|entry| !entry.is_expired());
        self.entries.clear();
        self.by_action.clear();
        had_live
    }

    /// Removes every entry derived from `action`, returning how many of them
    /// were live.
    pub fn clear_by_type(&mut self, action: &str) -> usize {
        let Some(keys) = self.by_action.remove(action) else {
            return 0;
        };

        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|entry| !entry.is_expired())
            .count()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }

        expired_keys.len()
    }

    // == Stats ==
    /// Returns a timestamped copy of the counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    fn is_pending_registration(&self, key: &CacheKey, id: EntryId) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.id == id && entry.is_pending())
    }

    fn insert(&mut self, key: CacheKey, entry: CacheEntry<T, E>) {
        self.by_action
            .entry(key.action().to_string())
            .or_default()
            .insert(key.clone());
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry<T, E>> {
        let entry = self.entries.remove(key)?;
        if let Some(keys) = self.by_action.get_mut(key.action()) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_action.remove(key.action());
            }
        }
        Some(entry)
    }
}

impl<T: Clone, E> Default for CacheStore<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
