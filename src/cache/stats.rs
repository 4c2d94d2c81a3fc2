/// Snapshot of the counters of a [`Cache`](crate::Cache) since the previous snapshot.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Stats {
    pub miss_count: u64,
    pub hit_count: u64,
    /// Entries dropped to stay within capacity. Explicit removals are not counted.
    pub eviction_count: u64,
    pub millis_elapsed: u128,
}

impl Stats {
    pub(crate) fn add(&mut self, counters: Counters) {
        self.hit_count += counters.hit_count;
        self.miss_count += counters.miss_count;
        self.eviction_count += counters.eviction_count;
    }
}

/// Per-shard counters. Only touched while the shard lock is held.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    hit_count: u64,
    miss_count: u64,
    eviction_count: u64,
}

impl Counters {
    pub(crate) fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }

    /// Returns the current counters and resets them to zero.
    pub(crate) fn take(&mut self) -> Counters {
        std::mem::take(self)
    }
}
