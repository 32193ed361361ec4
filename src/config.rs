//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// Durations are in milliseconds. An unset timeout means cached results never
/// expire on their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Global default TTL for resolved entries
    pub timeout: Option<u64>,
    /// Default TTL per action type, consulted before the global default
    pub action_timeouts: HashMap<String, u64>,
    /// Interval of the background sweep, None = no sweep task
    pub cleanup_interval: Option<u64>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ACTION_CACHE_TIMEOUT` - Global default TTL in ms (default: never expire)
    /// - `ACTION_CACHE_ACTION_TIMEOUTS` - Per-action TTLs as `name=ms,name=ms`
    /// - `ACTION_CACHE_CLEANUP_INTERVAL` - Sweep interval in ms (default: no sweep)
    ///
    /// Malformed values are ignored.
    pub fn from_env() -> Self {
        Self {
            timeout: env::var("ACTION_CACHE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok()),
            action_timeouts: env::var("ACTION_CACHE_ACTION_TIMEOUTS")
                .map(|v| parse_action_timeouts(&v))
                .unwrap_or_default(),
            cleanup_interval: env::var("ACTION_CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0),
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn with_action_timeout(mut self, action: impl Into<String>, timeout_ms: u64) -> Self {
        self.action_timeouts.insert(action.into(), timeout_ms);
        self
    }

    pub fn with_cleanup_interval(mut self, interval_ms: u64) -> Self {
        self.cleanup_interval = Some(interval_ms);
        self
    }

    /// Configured default TTL for `action`, if any.
    pub fn action_timeout(&self, action: &str) -> Option<u64> {
        self.action_timeouts.get(action).copied()
    }

    pub fn cleanup_interval_duration(&self) -> Option<Duration> {
        self.cleanup_interval.map(Duration::from_millis)
    }
}

fn parse_action_timeouts(raw: &str) -> HashMap<String, u64> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, ms) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), ms.trim().parse().ok()?))
        })
        .collect()
}
