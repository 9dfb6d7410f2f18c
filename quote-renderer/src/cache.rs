//! Bounded TTL cache with single-flight initialization.
//!
//! Concurrent misses for one key share a single in-flight initializer. The
//! map lock is only held to find or insert a slot, never across an `.await`,
//! so a slow initializer for one key never blocks callers of other keys.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Limits for a [`FlightCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub max_entries: usize,
    /// Time an entry lives after insertion.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 20,
            ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry, including ones joining an in-flight init.
    pub hits: u64,
    /// Lookups that had to start an initializer.
    pub misses: u64,
    /// Entries dropped for capacity.
    pub evictions: u64,
    /// Entries dropped for age.
    pub expirations: u64,
}

#[derive(Debug)]
struct Slot<V> {
    cell: Arc<OnceCell<V>>,
    inserted: Instant,
    last_accessed: Instant,
}

#[derive(Debug)]
struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn evict_expired(&mut self, now: Instant, ttl: Duration) {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| now.duration_since(slot.inserted) < ttl);
        self.stats.expirations += (before - self.slots.len()) as u64;
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_accessed)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.slots.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

/// Shared cache handle; clones refer to the same entries.
#[derive(Debug)]
pub struct FlightCache<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    config: CacheConfig,
}

impl<K, V> Clone for FlightCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for FlightCache<K, V> {
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> FlightCache<K, V> {
    /// Create a cache with the given limits.
    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                stats: CacheStats::default(),
            })),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The limits this cache was created with.
    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Return the cached value for `key`, running `init` on a miss.
    ///
    /// Callers arriving while `init` is running wait for its result instead
    /// of starting their own.
    pub async fn get_or_init<F, Fut>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let now = Instant::now();
            let mut inner = self.lock();
            inner.evict_expired(now, self.config.ttl);

            if let Some(slot) = inner.slots.get_mut(&key) {
                slot.last_accessed = now;
                let cell = Arc::clone(&slot.cell);
                inner.stats.hits += 1;
                cell
            } else {
                inner.stats.misses += 1;
                while inner.slots.len() >= self.config.max_entries.max(1) {
                    inner.evict_lru();
                }
                let cell = Arc::new(OnceCell::new());
                inner.slots.insert(
                    key,
                    Slot {
                        cell: Arc::clone(&cell),
                        inserted: now,
                        last_accessed: now,
                    },
                );
                cell
            }
        };

        cell.get_or_init(init).await.clone()
    }

    /// The finished value for `key`, if present and fresh.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.evict_expired(now, self.config.ttl);
        let slot = inner.slots.get_mut(key)?;
        slot.last_accessed = now;
        slot.cell.get().cloned()
    }

    /// Whether a fresh entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.lock()
            .slots
            .get(key)
            .is_some_and(|slot| now.duration_since(slot.inserted) < self.config.ttl)
    }

    /// Drop the entry for `key`.
    pub fn remove(&self, key: &K) -> bool {
        self.lock().slots.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().slots.clear();
    }

    /// Number of entries, expired ones included until the next lookup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    /// Snapshot of the statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}
