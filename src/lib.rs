//! Building blocks for sharded, request-deduplicating caching services.
//!
//! This crate provides the three algorithms a distributed cache node is built on:
//!
//! - [`LruCache`]: a bounded key/value store evicting the least recently used entry
//! - [`singleflight::Group`]: collapses concurrent calls for the same key into a single execution
//! - [`HashRing`]: consistent hashing with virtual replicas to find the node owning a key
//!
//! On top of these, [`Cache`] is a thread-safe, sharded LRU cache with hit and miss statistics.
//! Network transport, serialization and persistence are left to the embedding service.
//!
//! # Features
//!
//! - O(1) LRU operations on an index-linked slot arena
//! - Blocking waits on a per-call condition variable, no busy polling
//! - Ring placement that is stable across processes and platforms
//! - No unsafe code
//!
//! # Examples
//!
//! Putting the pieces together on a cache node:
//!
//! ```rust
//! use plain_groupcache::singleflight::Group;
//! use plain_groupcache::{Cache, HashRing};
//!
//! let mut peers = HashRing::new(50);
//! peers.add(["10.0.0.1:8000", "10.0.0.2:8000", "10.0.0.3:8000"]);
//!
//! let cache: Cache<String, String> = Cache::with_capacity(1_000);
//! let loads: Group<String, String> = Group::new();
//!
//! let key = "user:42";
//! let owner = peers.get(key).unwrap();
//!
//! let value = match cache.get(key) {
//!     Some(value) => value,
//!     None => {
//!         let value = loads
//!             .call(key, || Ok(format!("{key} loaded by {owner}")))
//!             .unwrap();
//!         cache.insert(key.to_string(), value.clone());
//!         value
//!     }
//! };
//!
//! assert_eq!(cache.get(key), Some(value));
//! ```
//!
//! Single-threaded LRU with an eviction callback:
//!
//! ```rust
//! use plain_groupcache::LruCache;
//! use plain_groupcache::config::LruConfig;
//! use plain_groupcache::lru::OnEvict;
//! use std::sync::{Arc, Mutex};
//!
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&evicted);
//! let on_evict: OnEvict<&str, i32> = Box::new(move |key, _| sink.lock().unwrap().push(*key));
//!
//! let mut cache = LruCache::init(LruConfig { max_entries: 2 }, Some(on_evict));
//!
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.put("c", 3);
//!
//! assert_eq!(*evicted.lock().unwrap(), vec!["a"]);
//! ```

#![forbid(unsafe_code)]
pub mod cache;
pub mod config;
pub mod error;
pub mod lru;
pub mod ring;
pub mod singleflight;

pub use cache::Cache;
pub use cache::stats::Stats;
pub use error::ConfigError;
pub use lru::LruCache;
pub use ring::HashRing;

pub(crate) type RandomState = ahash::RandomState;
