use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::lru::OnEvict;
use crate::{RandomState, Stats};
use parking_lot::Mutex;
use shard::Shard;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::num::NonZero;
use std::sync::Arc;
use std::time::Instant;
use std::{cmp, thread};

mod shard;
pub(crate) mod stats;

/// Listener shared by all shards, called for every entry that leaves the cache.
pub type EvictionListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Thread-safe LRU cache.
///
/// The cache is divided into multiple shards to reduce contention during concurrent access. Each
/// shard is an [`LruCache`](crate::LruCache) behind its own lock, so recency and eviction are
/// tracked per shard.
///
/// Wrap the cache in a [`std::sync::Arc`] to share it between threads. Both reads and writes only
/// require shared references to the cache.
#[derive(Debug)]
pub struct Cache<K, V, S = RandomState> {
    hash_builder: S,
    shards: Vec<Mutex<Shard<K, V, S>>>,
    metrics_last_accessed: Mutex<Instant>,
}

impl<K, V> Cache<K, V, RandomState>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Creates a new cache with at least the specified capacity. Zero means no limit.
    ///
    /// The actual capacity may be slightly higher due to sharding and rounding.
    pub fn with_capacity(capacity: usize) -> Cache<K, V, RandomState> {
        Cache::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Cache<K, V, RandomState>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
    /// Creates a cache from `config`, calling `listener` for every entry that leaves it.
    pub fn from_config(
        config: CacheConfig,
        listener: Option<EvictionListener<K, V>>,
    ) -> Result<Cache<K, V, RandomState>, ConfigError> {
        Cache::from_config_with_hasher(config, Default::default(), listener)
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Inserts a key-value pair into the cache.
    ///
    /// If the cache did not have this key present, [`None`] is returned.
    ///
    /// If the cache did have this key present, the value is updated, and the old value is returned.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        let mut shard = self.get_shard(hash).lock();
        shard.insert(key, value)
    }

    /// Returns the value corresponding to the key and marks it as most recently used.
    ///
    /// This method clones the value when returning the item. Consider wrapping your values in
    /// [`std::sync::Arc`] if cloning is too expensive for you use-case.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        let mut shard = self.get_shard(hash).lock();
        shard.get(key)
    }

    /// Removes the key from the cache, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        let mut shard = self.get_shard(hash).lock();
        shard.remove(key)
    }

    fn get_shard(&self, hash: u64) -> &Mutex<Shard<K, V, S>> {
        // upper bits, the shard's own map indexes by the lower ones
        let shard_idx = (hash >> 32) as usize % self.shards.len();
        &self.shards[shard_idx]
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: Clone + BuildHasher,
{
    /// Creates a new cache with at least the specified capacity, using `hash_builder` to hash the
    /// keys. Zero means no limit.
    ///
    /// The actual capacity may be slightly higher due to sharding and rounding.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Cache<K, V, S> {
        let number_of_shards = default_number_of_shards(capacity);
        Cache::build(capacity, number_of_shards, hash_builder, || None)
    }

    fn build(
        capacity: usize,
        number_of_shards: usize,
        hash_builder: S,
        mut on_evict: impl FnMut() -> Option<OnEvict<K, V>>,
    ) -> Cache<K, V, S> {
        let capacity_per_shard = capacity.div_ceil(number_of_shards);

        let mut shards = Vec::with_capacity(number_of_shards);

        for _ in 0..number_of_shards {
            let shard = Shard::with_capacity_and_hasher(
                capacity_per_shard,
                hash_builder.clone(),
                on_evict(),
            );
            shards.push(Mutex::new(shard))
        }

        tracing::debug!(
            capacity,
            shards = number_of_shards,
            capacity_per_shard,
            "created cache"
        );

        Self {
            hash_builder,
            shards,
            metrics_last_accessed: Mutex::new(Instant::now()),
        }
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
    S: Clone + BuildHasher,
{
    /// Creates a cache from `config`, using `hash_builder` to hash the keys and calling
    /// `listener` for every entry that leaves the cache.
    pub fn from_config_with_hasher(
        config: CacheConfig,
        hash_builder: S,
        listener: Option<EvictionListener<K, V>>,
    ) -> Result<Cache<K, V, S>, ConfigError> {
        config.validate()?;

        let number_of_shards = config
            .shards
            .unwrap_or_else(|| default_number_of_shards(config.capacity));

        let on_evict = || {
            listener.clone().map(|listener| {
                Box::new(move |key: &K, value: &V| listener(key, value)) as OnEvict<K, V>
            })
        };

        Ok(Cache::build(
            config.capacity,
            number_of_shards,
            hash_builder,
            on_evict,
        ))
    }
}

impl<K, V, S> Cache<K, V, S> {
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().len() == 0)
    }

    /// Removes all entries, one shard at a time.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    pub fn number_of_shards(&self) -> usize {
        self.shards.len()
    }

    /// Returns the counters collected since the previous call and resets them.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats::default();

        let millis_elapsed = {
            let mut guard = self.metrics_last_accessed.lock();
            let millis_elapsed = guard.elapsed().as_millis();
            *guard = Instant::now();
            millis_elapsed
        };

        stats.millis_elapsed = millis_elapsed;

        for shard in &self.shards {
            stats.add(shard.lock().take_counters());
        }

        stats
    }
}

fn default_number_of_shards(capacity: usize) -> usize {
    let available_parallelism = thread::available_parallelism()
        .map(NonZero::get)
        .unwrap_or(1);

    let number_of_shards = available_parallelism * 4;

    if capacity == 0 {
        number_of_shards
    } else {
        cmp::min(number_of_shards, capacity)
    }
}
