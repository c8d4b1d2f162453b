use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal statistics collector for the cache.
/// All counters are atomic to allow for lock-free updates from any thread.
///
/// When statistics are disabled at build time the `record_*` methods are
/// no-ops and every counter reads as zero.
#[derive(Debug)]
pub(crate) struct Stats {
  enabled: bool,
  hits: CachePadded<AtomicU64>,
  misses: CachePadded<AtomicU64>,
  loads: CachePadded<AtomicU64>,
  load_failures: CachePadded<AtomicU64>,
  evictions: CachePadded<AtomicU64>,
  total_load_time_nanos: CachePadded<AtomicU64>,
}

impl Stats {
  pub(crate) fn new(enabled: bool) -> Self {
    Self {
      enabled,
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      loads: CachePadded::new(AtomicU64::new(0)),
      load_failures: CachePadded::new(AtomicU64::new(0)),
      evictions: CachePadded::new(AtomicU64::new(0)),
      total_load_time_nanos: CachePadded::new(AtomicU64::new(0)),
    }
  }

  #[inline]
  pub(crate) fn record_hit(&self) {
    if self.enabled {
      self.hits.fetch_add(1, Ordering::Relaxed);
    }
  }

  #[inline]
  pub(crate) fn record_miss(&self) {
    if self.enabled {
      self.misses.fetch_add(1, Ordering::Relaxed);
    }
  }

  /// Records one completed compute and the time it took.
  #[inline]
  pub(crate) fn record_load(&self, elapsed: Duration) {
    if self.enabled {
      self.loads.fetch_add(1, Ordering::Relaxed);
      self
        .total_load_time_nanos
        .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }
  }

  #[inline]
  pub(crate) fn record_load_failure(&self) {
    if self.enabled {
      self.load_failures.fetch_add(1, Ordering::Relaxed);
    }
  }

  /// Records one capacity- or expiration-driven removal.
  #[inline]
  pub(crate) fn record_eviction(&self) {
    if self.enabled {
      self.evictions.fetch_add(1, Ordering::Relaxed);
    }
  }

  /// Creates a point-in-time snapshot of the current counters.
  pub(crate) fn snapshot(&self) -> StatsSnapshot {
    StatsSnapshot {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      loads: self.loads.load(Ordering::Relaxed),
      load_failures: self.load_failures.load(Ordering::Relaxed),
      evictions: self.evictions.load(Ordering::Relaxed),
      total_load_time: Duration::from_nanos(self.total_load_time_nanos.load(Ordering::Relaxed)),
    }
  }

  /// Zeroes every counter. The only operation that makes counters decrease.
  pub(crate) fn reset(&self) {
    self.hits.store(0, Ordering::Relaxed);
    self.misses.store(0, Ordering::Relaxed);
    self.loads.store(0, Ordering::Relaxed);
    self.load_failures.store(0, Ordering::Relaxed);
    self.evictions.store(0, Ordering::Relaxed);
    self.total_load_time_nanos.store(0, Ordering::Relaxed);
  }
}

/// A point-in-time, public-facing snapshot of the cache's statistics.
#[derive(Clone)]
pub struct StatsSnapshot {
  /// The number of lookups that found a live entry.
  pub hits: u64,
  /// The number of lookups that found nothing, or only an expired entry.
  pub misses: u64,
  /// The number of compute episodes that completed successfully.
  pub loads: u64,
  /// The number of compute episodes that failed or panicked.
  pub load_failures: u64,
  /// The number of entries removed by capacity pressure or expiration.
  /// Explicit removals and replacements are not evictions.
  pub evictions: u64,
  /// The cumulative wall-clock time spent in successful computes.
  pub total_load_time: Duration,
}

impl StatsSnapshot {
  /// Total number of lookups observed.
  pub fn request_count(&self) -> u64 {
    self.hits.saturating_add(self.misses)
  }

  /// The fraction of lookups that hit. Defined as `1.0` when no lookups
  /// have been recorded.
  pub fn hit_rate(&self) -> f64 {
    let requests = self.request_count();
    if requests == 0 {
      1.0
    } else {
      self.hits as f64 / requests as f64
    }
  }

  /// The fraction of lookups that missed. Defined as `0.0` when no lookups
  /// have been recorded.
  pub fn miss_rate(&self) -> f64 {
    let requests = self.request_count();
    if requests == 0 {
      0.0
    } else {
      self.misses as f64 / requests as f64
    }
  }

  /// Mean wall-clock time of a successful compute, or zero when none ran.
  pub fn average_load_time(&self) -> Duration {
    if self.loads == 0 {
      Duration::ZERO
    } else {
      Duration::from_nanos((self.total_load_time.as_nanos() / self.loads as u128) as u64)
    }
  }
}

impl fmt::Debug for StatsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StatsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_rate", &format!("{:.2}%", self.hit_rate() * 100.0))
      .field("loads", &self.loads)
      .field("load_failures", &self.load_failures)
      .field("evictions", &self.evictions)
      .field("total_load_time", &self.total_load_time)
      .finish()
  }
}
