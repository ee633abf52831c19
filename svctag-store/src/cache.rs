//! In-memory response cache with a single TTL.
//!
//! Entries are immutable once written and are evicted lazily when a lookup
//! finds them expired. Time comes from [`tokio::time::Instant`], so a paused
//! test clock controls expiry.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use svctag_core::ServiceTag;
use tokio::time::Instant;
use tracing::trace;

/// Default time-to-live for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted: Instant,
}

/// TTL cache keyed by service tag.
///
/// A TTL of zero disables caching: `put` is a no-op and `get` always misses.
#[derive(Debug)]
pub struct ResponseCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<ServiceTag, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns true if caching is enabled.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Returns the value for `tag` if it is younger than the TTL.
    pub fn get(&self, tag: &ServiceTag) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(tag) {
                None => return None,
                Some(entry) if now.duration_since(entry.inserted) < self.ttl => {
                    trace!(tag = %tag, "Cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: evict unless a concurrent put already replaced it.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries
            .get(tag)
            .is_some_and(|e| now.duration_since(e.inserted) >= self.ttl)
        {
            trace!(tag = %tag, "Evicting expired entry");
            entries.remove(tag);
        }
        None
    }

    /// Stores `value` for `tag`, replacing any previous entry.
    pub fn put(&self, tag: ServiceTag, value: V) {
        if !self.is_enabled() {
            return;
        }
        let entry = CacheEntry {
            value,
            inserted: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag, entry);
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// evicted.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.inserted) < self.ttl);
        before - entries.len()
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
