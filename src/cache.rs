use crate::builder::CacheBuilder;
use crate::error::LoadError;
use crate::iter::{EntryIter, KeyIter, ValueIter};
use crate::listener::{CacheListener, ListenerId};
use crate::shared::CacheShared;
use crate::stats::StatsSnapshot;

use std::convert::Infallible;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A thread-safe, in-memory cache with bounded capacity, pluggable eviction,
/// and optional expiration.
///
/// `Cache` is a cheap handle: cloning it shares the same underlying storage,
/// and all methods take `&self`, so one cache can serve any number of threads.
/// Values are stored behind `Arc<V>`, so `V` never needs to be `Clone`.
#[derive(Debug)]
pub struct Cache<K: Send, V: Send + Sync, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K: Send, V: Send + Sync, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K: Send, V: Send + Sync> Cache<K, V, ahash::RandomState> {
  /// Returns a builder for configuring a new cache.
  pub fn builder() -> CacheBuilder<K, V, ahash::RandomState> {
    CacheBuilder::new()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  /// Fetches the value for `key`, returning a clone of its `Arc`.
  ///
  /// A hit refreshes the entry's idle clock and its standing with the
  /// eviction policy. An entry past its expiration deadline is treated as
  /// absent and reclaimed on the spot.
  pub fn get(&self, key: &K) -> Option<Arc<V>> {
    let value = self.shared.read_live(key);
    if value.is_none() {
      self.shared.stats.record_miss();
    }
    value
  }

  /// Stores `key -> value`, replacing any previous value.
  ///
  /// Replacing a live entry resets its time-to-live clock (the write
  /// deadline is measured from the most recent write) while keeping the
  /// entry's original creation time. Listeners observe the old value as
  /// replaced, then the new value as put.
  pub fn put(&self, key: K, value: V) {
    self.shared.insert(key, value);
  }

  /// Removes `key` from the cache, returning the value that was present.
  ///
  /// Returns `None` if the key was absent or its entry had already expired;
  /// an expired entry is reclaimed and accounted as an expiration, not
  /// handed back to the caller.
  pub fn remove(&self, key: &K) -> Option<Arc<V>> {
    self.shared.remove(key)
  }

  /// Removes every entry from the cache.
  ///
  /// This is a stop-the-world operation: it briefly locks all shards so the
  /// table and the eviction policy reset together. No per-entry listener
  /// events are emitted.
  pub fn invalidate_all(&self) {
    self.shared.clear();
  }

  /// Returns `true` if a live (non-expired) entry exists for `key`.
  ///
  /// This is a peek: no statistics are recorded, the idle clock is not
  /// refreshed, and the eviction policy is not informed.
  pub fn contains_key(&self, key: &K) -> bool {
    self.shared.peek(key).is_some()
  }

  /// The number of resident entries.
  ///
  /// Entries that have expired but not yet been reclaimed are included.
  pub fn len(&self) -> usize {
    self.shared.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The configured capacity bound, or `None` for an unbounded cache.
  pub fn capacity(&self) -> Option<usize> {
    self.shared.capacity
  }

  /// Iterates over the cache's entries. See [`EntryIter`] for the
  /// consistency guarantees.
  pub fn entries(&self) -> EntryIter<'_, K, V, H> {
    EntryIter::new(&self.shared)
  }

  /// Iterates over the cache's keys.
  pub fn keys(&self) -> KeyIter<'_, K, V, H> {
    KeyIter::new(&self.shared)
  }

  /// Iterates over the cache's values.
  pub fn values(&self) -> ValueIter<'_, K, V, H> {
    ValueIter::new(&self.shared)
  }

  /// Returns a point-in-time snapshot of the cache's statistics.
  ///
  /// If statistics were disabled at build time, every counter reads zero.
  pub fn stats(&self) -> StatsSnapshot {
    self.shared.stats.snapshot()
  }

  /// Resets all statistics counters to zero.
  pub fn reset_stats(&self) {
    self.shared.stats.reset();
  }

  /// Registers a listener and returns a token that can later deregister it.
  ///
  /// Listeners registered on one handle observe events from every handle of
  /// the same cache. Registration is safe to race with cache traffic.
  pub fn add_listener(&self, listener: Arc<dyn CacheListener<K, V>>) -> ListenerId {
    self.shared.listeners.add(listener)
  }

  /// Deregisters a listener. Returns `false` if the token does not name a
  /// currently registered listener.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    self.shared.listeners.remove(id)
  }

  /// The number of listener callbacks that have panicked. Faulting
  /// listeners are isolated, not deregistered, so this can exceed the
  /// number of registered listeners.
  pub fn listener_fault_count(&self) -> u64 {
    self.shared.listeners.fault_count()
  }

  /// Fetches the value for `key`, running `compute` to produce it on a miss.
  ///
  /// Concurrent calls for the same absent key collapse into one computation:
  /// a single leader runs `compute` while the rest block and share its
  /// outcome. A successful value is stored before anyone observes it. An
  /// `Err` is returned to the leader and every waiter, and nothing is
  /// cached, so a later call retries.
  ///
  /// If `compute` panics, the panic propagates to the leader; waiters
  /// receive [`LoadError::Panicked`].
  ///
  /// `compute` must not touch this cache's `key` itself, or the two lookups
  /// will deadlock.
  pub fn get_or_compute<F, E>(&self, key: K, compute: F) -> Result<Arc<V>, LoadError>
  where
    F: FnOnce() -> Result<V, E>,
    E: std::error::Error + Send + Sync + 'static,
  {
    self.shared.load_or_compute(key, compute)
  }

  /// Fetches the value for `key`, running the infallible `compute` to
  /// produce it on a miss. The single-flight behavior matches
  /// [`get_or_compute`](Cache::get_or_compute).
  ///
  /// # Panics
  ///
  /// Panics if this call ends up sharing the outcome of a concurrent
  /// [`get_or_compute`](Cache::get_or_compute) for the same key that failed.
  pub fn get_with<F>(&self, key: K, compute: F) -> Arc<V>
  where
    F: FnOnce() -> V,
  {
    match self
      .shared
      .load_or_compute(key, || Ok::<V, Infallible>(compute()))
    {
      Ok(value) => value,
      Err(error) => panic!("cache load shared with a failing computation: {error}"),
    }
  }
}
