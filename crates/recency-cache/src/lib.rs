//! Bounded recency-ordered presence set with asynchronous eviction hand-off
//!
//! Tracks which keys are currently materialized somewhere (on disk, in a
//! remote store) without holding their payloads. When an admission pushes the
//! set past its capacity, the least recently used key is dropped and sent to a
//! bounded channel so a separate worker can reclaim whatever backs it.

mod cache;
mod types;

pub use cache::RecencyCache;
pub use types::{Admission, CacheStats, Eviction};
