//! Cache types

use serde::{Deserialize, Serialize};

/// Notification that a key left the cache because of capacity pressure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub key: String,
}

/// Outcome of [`RecencyCache::admit`](crate::RecencyCache::admit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Key was already present and is now the most recently used
    Refreshed,
    /// Key was inserted without displacing anything
    Inserted,
    /// Key was inserted and the named least recently used key was evicted
    Evicted(String),
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}
