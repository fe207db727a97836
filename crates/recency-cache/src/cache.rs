//! LRU presence tracking with eviction notifications

use crate::types::{Admission, CacheStats, Eviction};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// A fixed-capacity set of keys ordered by recency of use.
///
/// Holds no payloads: presence of a key means "the thing this key names is
/// materialized". Every access goes through one mutex, so the recency order
/// is total and the eviction victim is always the exact LRU entry at the
/// moment of the evicting admission.
///
/// Evicted keys are sent to a bounded channel after the lock is released.
/// When the channel is full, [`admit`](Self::admit) waits for room rather
/// than dropping the notification.
pub struct RecencyCache {
    order: Mutex<LruCache<String, ()>>,
    capacity: usize,
    notifier: mpsc::Sender<Eviction>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl RecencyCache {
    /// Create a cache holding at most `capacity` keys.
    ///
    /// A capacity of zero is treated as one, so an admitted key is never
    /// evicted by its own admission.
    pub fn new(capacity: usize, notifier: mpsc::Sender<Eviction>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            order: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            notifier,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Check whether `key` is present, marking it most recently used if so
    pub async fn lookup(&self, key: &str) -> bool {
        let present = self.order.lock().await.get(key).is_some();

        if present {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Recency cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Recency cache miss");
        }

        present
    }

    /// Record `key` as present and most recently used.
    ///
    /// Evicts at most one entry, the current LRU, and only when `key` is new
    /// and the cache is full.
    pub async fn admit(&self, key: &str) -> Admission {
        let admission = {
            let mut order = self.order.lock().await;
            if order.get(key).is_some() {
                Admission::Refreshed
            } else {
                // `key` is new here, so whatever push hands back is the LRU victim
                match order.push(key.to_string(), ()) {
                    Some((victim, ())) => Admission::Evicted(victim),
                    None => Admission::Inserted,
                }
            }
        };

        if let Admission::Evicted(victim) = &admission {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key, victim = %victim, "Evicted least recently used entry");

            let notification = Eviction {
                key: victim.clone(),
            };
            if self.notifier.send(notification).await.is_err() {
                warn!(victim = %victim, "Eviction receiver closed, notification dropped");
            }
        }

        admission
    }

    /// Presence check that leaves the recency order untouched
    pub async fn contains(&self, key: &str) -> bool {
        self.order.lock().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.order.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
