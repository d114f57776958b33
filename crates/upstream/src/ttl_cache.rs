//! Check-then-fill cache with a fixed time-to-live.
//!
//! The lock is never held across a fetch, so concurrent misses on the same
//! key may each call upstream; the last writer wins.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

/// A cached value and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Cached<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates a cache backed by the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry for `key` if it is younger than the TTL.
    pub fn get(&self, key: &K) -> Option<Cached<V>> {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .cloned()
    }

    /// Stores `value` with a fresh timestamp and returns the stored entry.
    pub fn insert(&self, key: K, value: V) -> Cached<V> {
        let entry = Cached {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.lock().insert(key, entry.clone());
        entry
    }

    /// Serves a fresh entry or runs `fetch` once and caches its result.
    ///
    /// Failed fetches are not cached.
    ///
    /// # Errors
    /// Returns the error from `fetch` on a miss.
    pub async fn get_or_try_fill<F, Fut, E>(&self, key: K, fetch: F) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = fetch().await?;
        Ok(self.insert(key, value))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}
