use crate::entry::CacheEntry;

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

use crossbeam_utils::CachePadded;
use parking_lot::RwLock;

/// A helper function to hash a key using a `BuildHasher`.
#[inline]
pub(crate) fn hash_key<K: Hash, H: BuildHasher>(hasher: &H, key: &K) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

/// The entry table, partitioned into multiple, independently locked shards.
///
/// This design allows for high concurrency by ensuring that operations on
/// different keys are unlikely to contend for the same lock.
pub(crate) struct ShardTable<K, V, H> {
  shards: Box<[CachePadded<RwLock<HashMap<K, CacheEntry<V>, H>>>]>,
  hasher: H,
}

impl<K, V, H> fmt::Debug for ShardTable<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShardTable")
      .field("num_shards", &self.shards.len())
      .finish()
  }
}

impl<K, V, H> ShardTable<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Creates a new `ShardTable` with the specified number of shards and hasher.
  pub(crate) fn new(num_shards: usize, hasher: H) -> Self {
    let mut shards = Vec::with_capacity(num_shards);
    for _ in 0..num_shards {
      let shard_map = HashMap::with_hasher(hasher.clone());
      shards.push(CachePadded::new(RwLock::new(shard_map)));
    }

    Self {
      shards: shards.into_boxed_slice(),
      hasher,
    }
  }

  /// Maps a key to the index of the shard that owns it.
  ///
  /// The pending-computation table reuses this index so a key's entry and its
  /// in-flight computation always live in the same slot position.
  #[inline]
  pub(crate) fn shard_index(&self, key: &K) -> usize {
    let hash = hash_key(&self.hasher, key);
    // Safe because the builder validates that num_shards > 0.
    hash as usize % self.shards.len()
  }

  /// Returns the shard lock at a known index.
  #[inline]
  pub(crate) fn shard(&self, index: usize) -> &RwLock<HashMap<K, CacheEntry<V>, H>> {
    &self.shards[index]
  }

  /// Returns a reference to the `RwLock` guarding the shard for a given key.
  ///
  /// The caller can then acquire a read or write lock on this shard.
  #[inline]
  pub(crate) fn shard_for(&self, key: &K) -> &RwLock<HashMap<K, CacheEntry<V>, H>> {
    self.shard(self.shard_index(key))
  }

  #[inline]
  pub(crate) fn num_shards(&self) -> usize {
    self.shards.len()
  }

  /// Returns an iterator over all the shard locks.
  /// This is useful for "stop-the-world" operations like `invalidate_all()`.
  pub(crate) fn iter_shards(&self) -> impl Iterator<Item = &RwLock<HashMap<K, CacheEntry<V>, H>>> {
    self.shards.iter().map(|padded_lock| &**padded_lock)
  }
}
