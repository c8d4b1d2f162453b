use crate::compute::{ComputeSlot, PendingComputes};
use crate::entry::CacheEntry;
use crate::error::LoadError;
use crate::expiry::ExpiryPolicy;
use crate::janitor::Janitor;
use crate::listener::{EvictionReason, ListenerRegistry};
use crate::policy::EvictionPolicy;
use crate::stats::Stats;
use crate::table::ShardTable;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_utils::CachePadded;
use once_cell::sync::OnceCell;

/// The internal, thread-safe core of the cache.
///
/// Locking discipline:
/// 1. A thread holds at most one entry shard lock at a time. The only
///    exception is [`clear`](CacheShared::clear), which takes every shard
///    lock in index order.
/// 2. The policy's internal lock may be taken while holding a shard lock.
///    Policies never touch shards, so the order cannot invert.
/// 3. A pending-compute slot mutex is taken before any shard lock, never
///    while one is held.
/// 4. Listener callbacks run with no locks held.
pub(crate) struct CacheShared<K: Send, V: Send + Sync, H> {
  pub(crate) table: ShardTable<K, V, H>,
  pub(crate) policy: Box<dyn EvictionPolicy<K>>,
  pub(crate) expiry: ExpiryPolicy,
  pub(crate) capacity: Option<usize>,
  /// Resident entry count, maintained under shard locks but readable without.
  pub(crate) live: CachePadded<AtomicUsize>,
  pub(crate) stats: Stats,
  pub(crate) listeners: ListenerRegistry<K, V>,
  pub(crate) pending: PendingComputes<K, V>,
  /// Set once by the builder after the core is behind an `Arc`.
  pub(crate) janitor: OnceCell<Janitor>,
}

impl<K: Send, V: Send + Sync, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("len", &self.live.load(Ordering::Relaxed))
      .field("capacity", &self.capacity)
      .field("expiry", &self.expiry)
      .field("stats", &self.stats.snapshot())
      .finish_non_exhaustive()
  }
}

/// What a read found under the shard lock. Follow-up work (policy updates,
/// stale purging, events) happens after the lock is released.
enum ReadOutcome<V> {
  Hit(Arc<V>),
  Stale,
  Miss,
}

impl<K, V, H> CacheShared<K, V, H>
where
  K: Eq + Hash + Clone + Send,
  V: Send + Sync,
  H: BuildHasher + Clone,
{
  /// The number of resident entries, including any that have expired but
  /// have not been purged yet.
  pub(crate) fn len(&self) -> usize {
    self.live.load(Ordering::Relaxed)
  }

  /// Looks up a live entry without recording statistics, refreshing idle
  /// time, or informing the policy. Expired entries are skipped, not purged.
  pub(crate) fn peek(&self, key: &K) -> Option<Arc<V>> {
    let guard = self.table.shard_for(key).read();
    guard
      .get(key)
      .filter(|entry| !entry.is_expired(&self.expiry))
      .map(|entry| entry.value())
  }

  /// Looks up a live entry with full hit-side accounting: the idle clock is
  /// refreshed, the policy sees the access, and a hit is recorded. A stale
  /// entry is purged. Misses record nothing; the caller decides what a miss
  /// means for statistics.
  pub(crate) fn read_live(&self, key: &K) -> Option<Arc<V>> {
    let outcome = {
      let guard = self.table.shard_for(key).read();
      match guard.get(key) {
        None => ReadOutcome::Miss,
        Some(entry) if entry.is_expired(&self.expiry) => ReadOutcome::Stale,
        Some(entry) => {
          if self.expiry.tracks_idle() {
            entry.touch_accessed();
          }
          ReadOutcome::Hit(entry.value())
        }
      }
    }; // Read lock is dropped here.

    match outcome {
      ReadOutcome::Hit(value) => {
        self.policy.on_access(key);
        self.stats.record_hit();
        Some(value)
      }
      ReadOutcome::Stale => {
        self.purge_expired(key);
        None
      }
      ReadOutcome::Miss => None,
    }
  }

  /// Stores `key -> value` and returns the stored payload.
  ///
  /// Overwriting a live entry keeps its creation time and reports the old
  /// payload as replaced. Overwriting an expired entry counts as an
  /// expiration followed by a fresh insert.
  pub(crate) fn insert(&self, key: K, value: V) -> Arc<V> {
    let shard = self.table.shard_for(&key);
    let mut guard = shard.write();

    match guard.get_mut(&key) {
      Some(entry) if !entry.is_expired(&self.expiry) => {
        let old = entry.replace(value);
        let new = entry.value();
        drop(guard);

        self.policy.on_access(&key);
        self.listeners.emit_evict(&key, &old, EvictionReason::Replaced);
        self.listeners.emit_put(&key, &new);
        new
      }
      Some(entry) => {
        // The slot holds a corpse. Retire it, then start a new lifetime
        // with a fresh creation stamp.
        let old = std::mem::replace(entry, CacheEntry::new(value));
        let new = entry.value();
        self.policy.on_remove(&key);
        self.policy.on_insert(key.clone());
        drop(guard);

        self.stats.record_eviction();
        self
          .listeners
          .emit_evict(&key, &old.value(), EvictionReason::Expired);
        self.listeners.emit_put(&key, &new);
        new
      }
      None => {
        let entry = CacheEntry::new(value);
        let new = entry.value();
        guard.insert(key.clone(), entry);
        // Policy registration happens under the shard lock so a concurrent
        // remove cannot observe the table and the policy out of step.
        self.policy.on_insert(key.clone());
        self.live.fetch_add(1, Ordering::Relaxed);
        drop(guard);

        self.listeners.emit_put(&key, &new);
        self.enforce_capacity();
        new
      }
    }
  }

  /// Removes `key` if present. A live entry is reported through `on_remove`
  /// and returned; an entry that had already expired is accounted as an
  /// expiration and the caller sees a miss.
  pub(crate) fn remove(&self, key: &K) -> Option<Arc<V>> {
    let shard = self.table.shard_for(key);
    let mut guard = shard.write();
    let entry = guard.remove(key)?;
    self.policy.on_remove(key);
    self.live.fetch_sub(1, Ordering::Relaxed);
    drop(guard);

    let value = entry.value();
    if entry.is_expired(&self.expiry) {
      self.stats.record_eviction();
      self
        .listeners
        .emit_evict(key, &value, EvictionReason::Expired);
      None
    } else {
      self.listeners.emit_remove(key, &value);
      Some(value)
    }
  }

  /// Removes `key` if it is still present and still expired, then accounts
  /// for the expiration. Safe against races: a concurrent overwrite that
  /// revived the key makes this a no-op.
  pub(crate) fn purge_expired(&self, key: &K) {
    let shard = self.table.shard_for(key);
    let mut guard = shard.write();
    let is_stale = guard
      .get(key)
      .map_or(false, |entry| entry.is_expired(&self.expiry));
    if !is_stale {
      return;
    }

    if let Some(entry) = guard.remove(key) {
      self.policy.on_remove(key);
      self.live.fetch_sub(1, Ordering::Relaxed);
      drop(guard);

      self.stats.record_eviction();
      self
        .listeners
        .emit_evict(key, &entry.value(), EvictionReason::Expired);
    }
  }

  /// Evicts policy-selected victims until the resident count is back under
  /// the capacity bound, or until the policy runs out of victims to name.
  pub(crate) fn enforce_capacity(&self) {
    let capacity = match self.capacity {
      Some(capacity) => capacity,
      None => return,
    };

    while self.live.load(Ordering::Relaxed) > capacity {
      let victim = match self.policy.select_victim() {
        Some(victim) => victim,
        None => {
          // Either the policy cannot name a resident victim, or concurrent
          // removals are mid-flight and the live count is momentarily ahead
          // of the policy's books. Give up; the next insert re-enforces.
          log::warn!("eviction policy produced no victim while over capacity");
          break;
        }
      };

      let removed = {
        let shard = self.table.shard_for(&victim);
        let mut guard = shard.write();
        match guard.remove(&victim) {
          Some(entry) => {
            self.policy.on_remove(&victim);
            self.live.fetch_sub(1, Ordering::Relaxed);
            Some(entry)
          }
          None => {
            // The victim vanished between selection and this lock, and
            // whoever removed it already adjusted the count. Drop the
            // policy's stale tracking and pick again.
            self.policy.on_remove(&victim);
            None
          }
        }
      }; // Write lock is dropped here.

      if let Some(entry) = removed {
        self.stats.record_eviction();
        self
          .listeners
          .emit_evict(&victim, &entry.value(), EvictionReason::Size);
      }
    }
  }

  /// Removes every entry. No per-entry events are emitted.
  ///
  /// Every shard lock is held at once so no insert can slip between the
  /// table wipe and the policy reset.
  pub(crate) fn clear(&self) {
    let mut guards: Vec<_> = self.table.iter_shards().map(|shard| shard.write()).collect();
    for guard in guards.iter_mut() {
      guard.clear();
    }
    self.policy.clear();
    self.live.store(0, Ordering::Relaxed);
  }

  /// One expiration pass over the whole table. Stale keys are collected
  /// under each shard's read lock and purged afterwards, so the write lock
  /// is only taken for keys that are actually dead.
  pub(crate) fn sweep(&self) {
    if self.expiry.is_disabled() {
      return;
    }

    for index in 0..self.table.num_shards() {
      let stale: Vec<K> = {
        let guard = self.table.shard(index).read();
        guard
          .iter()
          .filter(|(_, entry)| entry.is_expired(&self.expiry))
          .map(|(key, _)| key.clone())
          .collect()
      }; // Read lock is dropped here.

      for key in stale {
        self.purge_expired(&key);
      }
    }
  }

  /// The single-flight lookup behind `get_or_compute`.
  ///
  /// At most one thread (the leader) runs `compute` for a given absent key;
  /// the rest park until the leader settles the outcome. A successful value
  /// is stored through the normal insert path before waiters wake. Errors
  /// and panics are fanned out to waiters but never cached.
  pub(crate) fn load_or_compute<F, E>(&self, key: K, compute: F) -> Result<Arc<V>, LoadError>
  where
    F: FnOnce() -> Result<V, E>,
    E: std::error::Error + Send + Sync + 'static,
  {
    if let Some(value) = self.read_live(&key) {
      return Ok(value);
    }

    let index = self.table.shard_index(&key);

    // Joining an in-flight computation or becoming its leader is decided
    // atomically under the slot lock.
    let slot = {
      let mut slots = self.pending.slot(index).lock();
      if let Some(existing) = slots.get(&key) {
        let existing = existing.clone();
        drop(slots);

        let result = existing.wait();
        if result.is_ok() {
          self.stats.record_hit();
        }
        return result;
      }

      // The previous leader may have settled and cleared its slot between
      // the fast-path miss and this lock; its value would be resident now.
      if let Some(value) = self.read_live(&key) {
        return Ok(value);
      }

      let slot = Arc::new(ComputeSlot::new());
      slots.insert(key.clone(), slot.clone());
      slot
    }; // Slot lock is dropped here; the computation runs unlocked.

    self.stats.record_miss();
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(compute));
    let elapsed = start.elapsed();

    match outcome {
      Ok(Ok(value)) => {
        let stored = self.insert(key.clone(), value);
        self.stats.record_load(elapsed);
        // The value is resident before the slot disappears, so a thread
        // that misses the slot finds the entry instead.
        self.pending.slot(index).lock().remove(&key);
        slot.complete(stored.clone());
        Ok(stored)
      }
      Ok(Err(error)) => {
        let error = LoadError::failed(error);
        self.stats.record_load_failure();
        self.pending.slot(index).lock().remove(&key);
        slot.fail(error.clone());
        Err(error)
      }
      Err(payload) => {
        self.stats.record_load_failure();
        self.pending.slot(index).lock().remove(&key);
        slot.fail(LoadError::Panicked);
        panic::resume_unwind(payload);
      }
    }
  }
}
