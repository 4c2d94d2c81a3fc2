use crate::RandomState;
use crate::cache::stats::Counters;
use crate::config::LruConfig;
use crate::lru::{LruCache, OnEvict};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

#[derive(Debug)]
pub(crate) struct Shard<K, V, S = RandomState> {
    entries: LruCache<K, V, S>,
    counters: Counters,
}

impl<K, V, S> Shard<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
        on_evict: Option<OnEvict<K, V>>,
    ) -> Self {
        let config = LruConfig {
            max_entries: capacity,
        };

        Self {
            entries: LruCache::init_with_hasher(config, on_evict, hash_builder),
            counters: Counters::default(),
        }
    }

    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let max_entries = self.entries.max_entries();
        let evicts = max_entries != 0
            && self.entries.len() >= max_entries
            && !self.entries.contains(&key);

        let previous_value = self.entries.put(key, value);

        if evicts {
            self.counters.record_eviction();
        }

        previous_value
    }

    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.entries.get(key) {
            Some(value) => {
                self.counters.record_hit();
                Some(value.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.remove(key)
    }
}

impl<K, V, S> Shard<K, V, S> {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn take_counters(&mut self) -> Counters {
        self.counters.take()
    }
}
