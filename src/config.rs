//! Plain configuration structs for the primitives in this crate.
//!
//! ```
//! use plain_groupcache::config::{LruConfig, RingConfig};
//! use plain_groupcache::{HashRing, LruCache};
//!
//! let cache: LruCache<String, u64> = LruCache::init(LruConfig { max_entries: 128 }, None);
//! assert!(cache.is_empty());
//!
//! let ring = HashRing::from_config(RingConfig { replicas: 50 }).unwrap();
//! assert!(ring.is_empty());
//! ```

use crate::error::ConfigError;

/// Configuration for an [`LruCache`](crate::LruCache).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LruConfig {
    /// Maximum number of entries before the least recently used one is evicted.
    ///
    /// Zero means no limit; eviction is then up to the caller.
    pub max_entries: usize,
}

/// Configuration for a [`HashRing`](crate::HashRing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of virtual points placed on the ring for every node.
    pub replicas: usize,
}

impl RingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replicas == 0 {
            return Err(ConfigError::ZeroReplicas);
        }
        Ok(())
    }
}

/// Configuration for the thread-safe [`Cache`](crate::Cache).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total number of entries across all shards. Zero means no limit.
    pub capacity: usize,

    /// Number of shards. Derived from the available parallelism when `None`.
    pub shards: Option<usize>,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == Some(0) {
            return Err(ConfigError::ZeroShards);
        }
        Ok(())
    }
}
