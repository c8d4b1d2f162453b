//! Contains types for iterating over a cache's contents.

use crate::shared::CacheShared;

use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// An iterator over a semi-consistent snapshot of the cache's entries.
///
/// It works by taking a point-in-time snapshot of the keys from one shard at
/// a time, holding that shard's read lock only while the keys are copied.
///
/// # Consistency Guarantees
/// - The set of keys for any given shard is fixed at the moment that shard is
///   first scanned. Inserts into a shard that has already been scanned will
///   be missed; inserts into shards not yet scanned may be included.
/// - The collection of all items yielded does not represent a single
///   point-in-time snapshot of the entire cache.
/// - The *values* are fetched at the moment `next()` is called. A key whose
///   entry was removed, replaced, or expired in the meantime is skipped.
///
/// Iteration is silent: it records no statistics, does not refresh idle
/// time, and leaves expired entries for the janitor to reclaim.
pub struct EntryIter<'a, K: Send, V: Send + Sync, H> {
  shared: &'a CacheShared<K, V, H>,
  shard_keys: Vec<K>,
  key_idx: usize,
  shard_idx: usize,
}

impl<'a, K, V, H> EntryIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  pub(crate) fn new(shared: &'a CacheShared<K, V, H>) -> Self {
    Self {
      shared,
      shard_keys: Vec::new(),
      key_idx: 0,
      shard_idx: 0,
    }
  }

  /// Fills the internal `shard_keys` buffer by snapshotting the next
  /// non-empty shard. Returns `false` when there are no more shards.
  fn load_next_shard(&mut self) -> bool {
    let num_shards = self.shared.table.num_shards();
    while self.shard_idx < num_shards {
      let shard = self.shared.table.shard(self.shard_idx);
      self.shard_idx += 1;

      let guard = shard.read();
      if !guard.is_empty() {
        self.shard_keys = guard.keys().cloned().collect();
        self.key_idx = 0;
        return true;
      }
      // An empty shard has nothing to snapshot; check the next one.
    }
    false
  }
}

impl<'a, K, V, H> Iterator for EntryIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  type Item = (K, Arc<V>);

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      // Try the next key from the current shard's snapshot.
      if let Some(key) = self.shard_keys.get(self.key_idx) {
        self.key_idx += 1;
        // The entry might have been removed or expired between the
        // snapshot and now. If so, skip it and try the next key.
        if let Some(value) = self.shared.peek(key) {
          return Some((key.clone(), value));
        }
      } else if !self.load_next_shard() {
        // No more shards to load, the iteration is complete.
        return None;
      }
    }
  }
}

/// An iterator over the cache's keys, with the same guarantees as
/// [`EntryIter`].
pub struct KeyIter<'a, K: Send, V: Send + Sync, H> {
  inner: EntryIter<'a, K, V, H>,
}

impl<'a, K, V, H> KeyIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  pub(crate) fn new(shared: &'a CacheShared<K, V, H>) -> Self {
    Self {
      inner: EntryIter::new(shared),
    }
  }
}

impl<'a, K, V, H> Iterator for KeyIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  type Item = K;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(key, _)| key)
  }
}

/// An iterator over the cache's values, with the same guarantees as
/// [`EntryIter`].
pub struct ValueIter<'a, K: Send, V: Send + Sync, H> {
  inner: EntryIter<'a, K, V, H>,
}

impl<'a, K, V, H> ValueIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  pub(crate) fn new(shared: &'a CacheShared<K, V, H>) -> Self {
    Self {
      inner: EntryIter::new(shared),
    }
  }
}

impl<'a, K, V, H> Iterator for ValueIter<'a, K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  type Item = Arc<V>;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(_, value)| value)
  }
}
