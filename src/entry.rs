use crate::expiry::ExpiryPolicy;
use crate::time;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A container for a value in the cache, holding all necessary metadata.
///
/// A key maps to exactly one entry for its whole lifetime in the table:
/// replacing the value mutates the entry in place and preserves its creation
/// time. Timestamps are nanoseconds since the cache epoch (see `time`).
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Arc<V>,
  /// When the entry was first inserted. Survives value replacement.
  created_at: u64,
  /// The last write timestamp. TTL deadlines are measured from here.
  last_written: AtomicU64,
  /// The last access timestamp. TTI deadlines are measured from here.
  /// Refreshed by reads and writes alike.
  last_accessed: AtomicU64,
}

// The value is deliberately absent: `V` carries no `Debug` bound.
impl<V> fmt::Debug for CacheEntry<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheEntry")
      .field("created_at", &self.created_at)
      .field("last_written", &self.last_written.load(Ordering::Relaxed))
      .field("last_accessed", &self.last_accessed.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<V> CacheEntry<V> {
  /// Creates a new `CacheEntry` stamped with the current time.
  pub(crate) fn new(value: V) -> Self {
    let now = time::now_nanos();
    Self {
      value: Arc::new(value),
      created_at: now,
      last_written: AtomicU64::new(now),
      last_accessed: AtomicU64::new(now),
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  /// Replaces the stored value in place, refreshing the write and access
  /// timestamps but keeping the creation time. Returns the previous value.
  pub(crate) fn replace(&mut self, value: V) -> Arc<V> {
    let now = time::now_nanos();
    self.last_written.store(now, Ordering::Relaxed);
    self.last_accessed.store(now, Ordering::Relaxed);
    std::mem::replace(&mut self.value, Arc::new(value))
  }

  /// When the entry was first inserted, in nanoseconds since the cache epoch.
  #[cfg(test)]
  pub(crate) fn created_at(&self) -> u64 {
    self.created_at
  }

  /// Updates the last accessed timestamp to the current time.
  /// This is a cheap atomic store operation.
  #[inline]
  pub(crate) fn touch_accessed(&self) {
    self.last_accessed.store(time::now_nanos(), Ordering::Relaxed);
  }

  /// Checks if the entry is expired under the configured windows.
  #[inline]
  pub(crate) fn is_expired(&self, expiry: &ExpiryPolicy) -> bool {
    if expiry.is_disabled() {
      return false;
    }
    let now = time::now_nanos();

    // Check for TTL expiration, measured from the last write.
    if let Some(ttl) = expiry.time_to_live {
      let written = self.last_written.load(Ordering::Relaxed);
      if now >= written.saturating_add(ttl.as_nanos() as u64) {
        return true;
      }
    }

    // Check for TTI expiration, measured from the last access.
    if let Some(tti) = expiry.time_to_idle {
      let accessed = self.last_accessed.load(Ordering::Relaxed);
      if now >= accessed.saturating_add(tti.as_nanos() as u64) {
        return true;
      }
    }

    false
  }
}
