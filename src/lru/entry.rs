use std::mem;

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Stores `value` and hands back the one it replaced.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }

    pub(crate) fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}
