//! Fixed-shard concurrent map from integer key to numeric value.
//!
//! Grounded on `concurrent_map.h`: `S` independent `(mutex, ordered map)`
//! shards, selected by `key mod S`. Built on `Mutex<BTreeMap<K, V>>` rather
//! than a crate like `dashmap` — this type needs an exact, caller-chosen
//! shard count and an ordered per-shard snapshot, neither of which
//! `dashmap`'s internal sharding gives direct control over.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// A key type usable with [`ShardedMap`]. Shard selection is
/// `key.shard_index() % shard_count`.
pub trait ShardKey: Ord + Copy {
    fn shard_index(&self) -> u64;
}

impl ShardKey for i64 {
    fn shard_index(&self) -> u64 {
        *self as u64
    }
}

struct Shard<K: Ord, V> {
    data: Mutex<BTreeMap<K, V>>,
}

/// A concurrent map over a fixed number of shards, each independently
/// locked. No operation ever holds more than one shard's lock at a time,
/// so shard-level deadlock cannot occur.
pub struct ShardedMap<K: Ord, V> {
    shards: Vec<Shard<K, V>>,
}

impl<K, V> ShardedMap<K, V>
where
    K: ShardKey,
    V: Default + Clone,
{
    /// Builds a map with `shard_count` independent shards.
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count > 0, "shard count must be positive");
        let shards = (0..shard_count)
            .map(|_| Shard {
                data: Mutex::new(BTreeMap::new()),
            })
            .collect();
        Self { shards }
    }

    fn shard_for(&self, key: &K) -> &Shard<K, V> {
        let index = (key.shard_index() as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Applies `f` to the value at `key` under the owning shard's lock,
    /// default-initializing it first if absent, and returns `f`'s result.
    /// The shard lock is held only for the duration of this call.
    pub fn with_mut<R>(&self, key: K, f: impl FnOnce(&mut V) -> R) -> R {
        let shard = self.shard_for(&key);
        let mut guard = shard.data.lock().expect("sharded map mutex poisoned");
        let entry = guard.entry(key).or_insert_with(V::default);
        f(entry)
    }

    /// Removes `key` from its owning shard if present.
    pub fn erase(&self, key: K) {
        let shard = self.shard_for(&key);
        let mut guard = shard.data.lock().expect("sharded map mutex poisoned");
        guard.remove(&key);
    }

    /// Merges every shard into a single ordered map, locking and
    /// releasing one shard at a time. Consistent only if no writer is
    /// concurrently active.
    pub fn build_ordinary_map(&self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for shard in &self.shards {
            let guard = shard.data.lock().expect("sharded map mutex poisoned");
            for (k, v) in guard.iter() {
                result.insert(*k, v.clone());
            }
        }
        result
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
