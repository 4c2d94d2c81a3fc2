//! Consistent hashing with virtual replicas.
//!
//! Every node is placed on a ring of `u32` hash values at `replicas` points. A key belongs to the
//! node owning the first point at or after the key's hash, wrapping around to the smallest point.
//! Adding a node only moves the keys that fall onto its new points.
//!
//! The default hash function is CRC-32 (IEEE), which is stable across processes, platforms and
//! releases, so independent nodes agree on the owner of a key.
//!
//! ```
//! use plain_groupcache::HashRing;
//!
//! let mut ring = HashRing::new(50);
//! ring.add(["cache-a:8080", "cache-b:8080", "cache-c:8080"]);
//!
//! let owner = ring.get("user:42").unwrap();
//! assert_eq!(ring.get("user:42"), Some(owner));
//! ```

use crate::RandomState;
use crate::config::RingConfig;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;

/// Function hashing the bytes of a key or a virtual point onto the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Hash ring assigning keys to nodes.
///
/// Hash collisions between virtual points are not resolved: the node added last owns the
/// colliding point.
pub struct HashRing<H = HashFn> {
    hash: H,
    replicas: usize,
    // sorted ascending whenever `add` returns
    points: Vec<u32>,
    owners: HashMap<u32, String, RandomState>,
}

impl HashRing<HashFn> {
    /// Creates an empty ring placing `replicas` points per node, hashed with CRC-32.
    ///
    /// A ring with zero replicas never holds any point and stays empty.
    pub fn new(replicas: usize) -> HashRing<HashFn> {
        HashRing::with_hasher(replicas, crc32fast::hash)
    }

    pub fn from_config(config: RingConfig) -> Result<HashRing<HashFn>, ConfigError> {
        config.validate()?;
        Ok(HashRing::new(config.replicas))
    }
}

impl<H> HashRing<H>
where
    H: Fn(&[u8]) -> u32,
{
    pub fn with_hasher(replicas: usize, hash: H) -> HashRing<H> {
        HashRing {
            hash,
            replicas,
            points: Vec::new(),
            owners: HashMap::default(),
        }
    }

    pub fn from_config_with_hasher(
        config: RingConfig,
        hash: H,
    ) -> Result<HashRing<H>, ConfigError> {
        config.validate()?;
        Ok(HashRing::with_hasher(config.replicas, hash))
    }

    /// Adds nodes to the ring.
    ///
    /// The point for replica `i` of a node is the hash of the decimal representation of `i`
    /// followed by the node identifier.
    pub fn add<I>(&mut self, nodes: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut added = 0;

        for node in nodes {
            let node = node.as_ref();
            self.points.reserve(self.replicas);

            for replica in 0..self.replicas {
                let point = (self.hash)(format!("{replica}{node}").as_bytes());
                self.points.push(point);
                self.owners.insert(point, node.to_owned());
            }

            added += 1;
        }

        self.points.sort_unstable();

        tracing::debug!(added, points = self.points.len(), "added nodes to hash ring");
    }

    /// Returns the node owning `key`, or `None` if the ring is empty.
    pub fn get<Q>(&self, key: &Q) -> Option<&str>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        if self.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_ref());

        let mut index = self.points.partition_point(|point| *point < hash);
        if index == self.points.len() {
            // past the largest point, wrap around to the first one
            index = 0;
        }

        self.owners.get(&self.points[index]).map(String::as_str)
    }
}

impl<H> HashRing<H> {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of virtual points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

impl<H> fmt::Debug for HashRing<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}
