use crate::RandomState;
use crate::config::LruConfig;
use entry::Entry;
use slot_list::SlotList;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::{cmp, iter};

mod entry;
mod slot_list;

/// Upper bound for the number of slots reserved up front.
const PREALLOCATED_ENTRIES: usize = 1_024;

/// Callback invoked with the key and value of every entry that leaves an [`LruCache`].
pub type OnEvict<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// Fixed-capacity key/value store that evicts the least recently used entry.
///
/// Entries live in an index-linked slot arena ordered from most to least recently used, paired
/// with a hash map from key to slot. Every operation is O(1) amortized.
///
/// The cache is not synchronized. Wrap it in a lock, or use [`Cache`](crate::Cache), to share it
/// between threads.
///
/// ```
/// use plain_groupcache::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get("a");
/// cache.put("c", 3);
///
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.get("a"), Some(&1));
/// ```
pub struct LruCache<K, V, S = RandomState> {
    max_entries: usize,
    index: HashMap<K, usize, S>,
    entries: SlotList<Entry<K, V>>,
    on_evict: Option<OnEvict<K, V>>,
}

impl<K, V> LruCache<K, V, RandomState>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache holding at most `max_entries` entries.
    ///
    /// A `max_entries` of zero means no limit; eviction is then up to the caller.
    pub fn new(max_entries: usize) -> LruCache<K, V, RandomState> {
        LruCache::with_hasher(max_entries, Default::default())
    }

    /// Creates a cache from `config`, calling `on_evict` for every entry that leaves it.
    pub fn init(
        config: LruConfig,
        on_evict: Option<OnEvict<K, V>>,
    ) -> LruCache<K, V, RandomState> {
        LruCache::init_with_hasher(config, on_evict, Default::default())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(max_entries: usize, hash_builder: S) -> LruCache<K, V, S> {
        LruCache::init_with_hasher(LruConfig { max_entries }, None, hash_builder)
    }

    pub fn init_with_hasher(
        config: LruConfig,
        on_evict: Option<OnEvict<K, V>>,
        hash_builder: S,
    ) -> LruCache<K, V, S> {
        let preallocated = if config.max_entries == 0 {
            0
        } else {
            cmp::min(config.max_entries, PREALLOCATED_ENTRIES)
        };

        LruCache {
            max_entries: config.max_entries,
            index: HashMap::with_capacity_and_hasher(preallocated, hash_builder),
            entries: SlotList::with_capacity(preallocated),
            on_evict,
        }
    }

    /// Inserts a key-value pair and marks it as most recently used.
    ///
    /// If the key was present its value is replaced and the old value is returned; nothing is
    /// evicted in that case. Otherwise the entry is inserted first and, if the cache now holds
    /// more than `max_entries` entries, the least recently used one is evicted.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&index) = self.index.get(&key) {
            self.entries.move_to_front(index);
            let entry = self
                .entries
                .get_mut(index)
                .expect("an entry must exist for an index");
            return Some(entry.replace_value(value));
        }

        let index = self.entries.push_front(Entry::new(key.clone(), value));
        self.index.insert(key, index);

        if self.max_entries != 0 && self.entries.len() > self.max_entries {
            self.remove_oldest();
        }

        None
    }

    /// Returns the value for `key` and marks the entry as most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = *self.index.get(key)?;
        self.entries.move_to_front(index);
        self.entries.get(index).map(Entry::value)
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = *self.index.get(key)?;
        self.entries.get(index).map(Entry::value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(key)
    }

    /// Removes `key` from the cache and returns its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.index.remove(key)?;
        let entry = self
            .entries
            .remove(index)
            .expect("an entry must exist for an index");

        self.evicted(&entry);
        let (_, value) = entry.into_parts();
        Some(value)
    }

    /// Removes the least recently used entry, if any.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.entries.pop_back()?;
        self.index.remove(entry.key());

        self.evicted(&entry);
        Some(entry.into_parts())
    }
}

impl<K, V, S> LruCache<K, V, S> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured limit; zero means unlimited.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Iterates from the most to the least recently used entry.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|entry| (entry.key(), entry.value()))
    }

    /// Removes every entry, calling the eviction callback for each one first.
    pub fn clear(&mut self) {
        if let Some(on_evict) = self.on_evict.as_mut() {
            for entry in self.entries.iter() {
                on_evict(entry.key(), entry.value());
            }
        }

        tracing::trace!(removed = self.entries.len(), "cleared lru cache");

        self.entries.clear();
        self.index.clear();
    }

    fn evicted(&mut self, entry: &Entry<K, V>) {
        tracing::trace!(remaining = self.entries.len(), "entry left lru cache");

        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(entry.key(), entry.value());
        }
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_entries", &self.max_entries)
            .field("entries", &DebugEntries(self))
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}

struct DebugEntries<'a, K, V, S>(&'a LruCache<K, V, S>);

impl<K, V, S> fmt::Debug for DebugEntries<'_, K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for LruCache<K, V, S>
where
    K: Clone + Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K, V> iter::FromIterator<(K, V)> for LruCache<K, V, RandomState>
where
    K: Clone + Eq + Hash,
{
    /// Collects into an unbounded cache; the last pair yielded is the most recently used.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cache = LruCache::new(0);
        cache.extend(iter);
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<(String, u32)>>>;

    fn recording_cache(max_entries: usize) -> (LruCache<String, u32>, Log) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let on_evict: OnEvict<String, u32> =
            Box::new(move |key, value| sink.lock().push((key.clone(), *value)));

        (LruCache::init(LruConfig { max_entries }, Some(on_evict)), log)
    }

    fn keys<V, S>(cache: &LruCache<String, V, S>) -> Vec<&str> {
        cache.iter().map(|(key, _)| key.as_str()).collect()
    }

    #[test]
    fn it_puts_and_gets_values() {
        // given
        let mut cache = LruCache::new(10);

        // when
        cache.put("key1", "value1");

        // then
        assert_eq!(cache.get("key1"), Some(&"value1"));
        assert_eq!(cache.get("key2"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn it_evicts_the_first_inserted_key_when_over_capacity() {
        // given
        let (mut cache, log) = recording_cache(3);

        // when
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.put(key.to_string(), i as u32);
        }

        // then
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert_eq!(keys(&cache), vec!["d", "c", "b"]);
        assert_eq!(*log.lock(), vec![(String::from("a"), 0)]);
    }

    #[test]
    fn it_keeps_len_at_capacity() {
        // given
        let mut cache = LruCache::new(5);

        // when
        for i in 0..100 {
            cache.put(i, i);
        }

        // then
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.peek(&95), Some(&95));
        assert_eq!(cache.peek(&94), None);
    }

    #[test]
    fn it_protects_recently_read_entries_from_eviction() {
        // given
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        // when
        cache.get("a");
        cache.put("c", 3);

        // then
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("c"), Some(&3));
    }

    #[test]
    fn it_updates_without_evicting() {
        // given
        let (mut cache, log) = recording_cache(2);
        cache.put(String::from("a"), 1);
        cache.put(String::from("b"), 2);

        // when
        let old_value = cache.put(String::from("a"), 10);

        // then
        assert_eq!(old_value, Some(1));
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["a", "b"]);
        assert_eq!(cache.peek("a"), Some(&10));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn it_does_not_promote_on_peek() {
        // given
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        // when
        assert_eq!(cache.peek("a"), Some(&1));
        cache.put("c", 3);

        // then
        assert!(!cache.contains("a"));
    }

    #[test]
    fn it_treats_zero_max_entries_as_unlimited() {
        // given
        let mut cache = LruCache::new(0);

        // when
        for i in 0..10_000 {
            cache.put(i, i);
        }

        // then
        assert_eq!(cache.len(), 10_000);
        assert_eq!(cache.max_entries(), 0);
    }

    #[test]
    fn it_ignores_missing_keys_on_remove() {
        // given
        let (mut cache, log) = recording_cache(2);

        // when
        let removed = cache.remove("missing");
        let oldest = cache.remove_oldest();

        // then
        assert_eq!(removed, None);
        assert_eq!(oldest, None);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn it_removes_the_oldest_entry() {
        // given
        let mut cache = LruCache::new(0);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.get("a");

        // when
        let oldest = cache.remove_oldest();

        // then
        assert_eq!(oldest, Some(("b", 2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn it_calls_the_eviction_callback_once_per_removed_entry() {
        // given
        let (mut cache, log) = recording_cache(2);
        cache.put(String::from("a"), 1);
        cache.put(String::from("b"), 2);
        cache.put(String::from("c"), 3);
        cache.put(String::from("d"), 4);
        cache.put(String::from("e"), 5);

        // when
        cache.remove("d");
        cache.remove_oldest();
        cache.put(String::from("f"), 6);
        cache.put(String::from("g"), 7);
        cache.clear();

        // then
        let mut log = log.lock().clone();
        let capacity_evictions: Vec<_> = log.drain(..3).collect();
        assert_eq!(
            capacity_evictions,
            vec![
                (String::from("a"), 1),
                (String::from("b"), 2),
                (String::from("c"), 3)
            ]
        );
        assert_eq!(
            log.drain(..2).collect::<Vec<_>>(),
            vec![(String::from("d"), 4), (String::from("e"), 5)]
        );
        log.sort();
        assert_eq!(log, vec![(String::from("f"), 6), (String::from("g"), 7)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn it_is_reusable_after_clear() {
        // given
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.clear();

        // when
        cache.put("b", 2);
        cache.put("c", 3);
        cache.put("d", 4);

        // then
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("d"), Some(&4));
    }

    #[test]
    fn it_collects_from_an_iterator() {
        // when
        let cache: LruCache<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();

        // then
        assert_eq!(cache.iter().collect::<Vec<_>>(), vec![(&"b", &2), (&"a", &1)]);
        assert_eq!(
            format!("{cache:?}"),
            r#"LruCache { max_entries: 0, entries: {"b": 2, "a": 1}, on_evict: false }"#
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u32),
        Get(u8),
        Remove(u8),
        RemoveOldest,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16, any::<u32>()).prop_map(|(key, value)| Op::Put(key, value)),
            (0u8..16).prop_map(Op::Get),
            (0u8..16).prop_map(Op::Remove),
            Just(Op::RemoveOldest),
        ]
    }

    proptest! {
        /// Property: the cache behaves like a naive most-recent-first list.
        #[test]
        fn prop_matches_reference_model(
            max_entries in 0usize..8,
            ops in prop::collection::vec(op(), 0..200)
        ) {
            let evicted: Arc<Mutex<Vec<(u8, u32)>>> = Arc::default();
            let sink = Arc::clone(&evicted);
            let on_evict: OnEvict<u8, u32> =
                Box::new(move |key, value| sink.lock().push((*key, *value)));
            let mut cache = LruCache::init(LruConfig { max_entries }, Some(on_evict));

            let mut model: Vec<(u8, u32)> = Vec::new();
            let mut expected_evicted = Vec::new();

            for op in ops {
                match op {
                    Op::Put(key, value) => {
                        let position = model.iter().position(|(k, _)| *k == key);
                        let old_value = position.map(|position| model.remove(position).1);
                        prop_assert_eq!(cache.put(key, value), old_value);
                        model.insert(0, (key, value));
                        if old_value.is_none() && max_entries != 0 && model.len() > max_entries {
                            expected_evicted.extend(model.pop());
                        }
                    }
                    Op::Get(key) => {
                        let position = model.iter().position(|(k, _)| *k == key);
                        let expected = position.map(|position| {
                            let item = model.remove(position);
                            model.insert(0, item);
                            item.1
                        });
                        prop_assert_eq!(cache.get(&key).copied(), expected);
                    }
                    Op::Remove(key) => {
                        let position = model.iter().position(|(k, _)| *k == key);
                        let expected = position.map(|position| model.remove(position));
                        expected_evicted.extend(expected);
                        prop_assert_eq!(cache.remove(&key), expected.map(|(_, v)| v));
                    }
                    Op::RemoveOldest => {
                        let expected = model.pop();
                        expected_evicted.extend(expected);
                        prop_assert_eq!(cache.remove_oldest(), expected);
                    }
                }

                if max_entries != 0 {
                    prop_assert!(cache.len() <= max_entries);
                }
                let actual: Vec<(u8, u32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&actual, &model);
                prop_assert_eq!(&*evicted.lock(), &expected_evicted);
            }
        }
    }
}
