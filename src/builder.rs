use crate::cache::Cache;
use crate::compute::PendingComputes;
use crate::error::BuildError;
use crate::expiry::ExpiryPolicy;
use crate::janitor::Janitor;
use crate::listener::{CacheListener, ListenerFaultHandler, ListenerRegistry};
use crate::policy::unbounded::Unbounded;
use crate::policy::{EvictionPolicy, PolicyKind};
use crate::shared::CacheShared;
use crate::stats::Stats;
use crate::table::ShardTable;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_utils::CachePadded;
use once_cell::sync::OnceCell;

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K: Send, V: Send, H = ahash::RandomState> {
  pub(crate) capacity: Option<usize>,
  pub(crate) shards: usize,
  pub(crate) time_to_live: Option<Duration>,
  pub(crate) time_to_idle: Option<Duration>,
  pub(crate) hasher: H,
  pub(crate) statistics: bool,
  pub(crate) sweep_interval: Option<Duration>,
  policy: Option<Box<dyn EvictionPolicy<K>>>,
  listeners: Vec<Arc<dyn CacheListener<K, V>>>,
  fault_handler: Option<ListenerFaultHandler>,
}

// Manual Debug implementation for CacheBuilder.
impl<K: Send, V: Send, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("shards", &self.shards)
      .field("time_to_live", &self.time_to_live)
      .field("time_to_idle", &self.time_to_idle)
      .field("statistics", &self.statistics)
      .field("has_policy", &self.policy.is_some())
      .field("num_listeners", &self.listeners.len())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K: Send, V: Send, H> CacheBuilder<K, V, H> {
  /// Bounds the cache to at most `size` entries.
  ///
  /// When an insert pushes the cache past this bound, the eviction policy
  /// names victims until the count is back within it. A size of zero is
  /// rejected at build time.
  pub fn maximum_size(mut self, size: usize) -> Self {
    self.capacity = Some(size);
    self
  }

  /// Removes the capacity bound. This is the default.
  pub fn unbounded(mut self) -> Self {
    self.capacity = None;
    self
  }

  /// Sets the number of concurrent shards to use.
  ///
  /// Defaults to four times the number of logical CPUs.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = shards;
    self
  }

  /// Expires entries a fixed duration after they were last written.
  pub fn expire_after_write(mut self, duration: Duration) -> Self {
    self.time_to_live = Some(duration);
    self
  }

  /// Expires entries a fixed duration after they were last read or written.
  pub fn expire_after_access(mut self, duration: Duration) -> Self {
    self.time_to_idle = Some(duration);
    self
  }

  /// Enables or disables statistics collection. Enabled by default; when
  /// disabled, every counter stays at zero and recording has no cost.
  pub fn statistics(mut self, enabled: bool) -> Self {
    self.statistics = enabled;
    self
  }

  /// Sets the tick interval of the background expiration sweeper.
  ///
  /// Defaults to one second. The sweeper only runs when an expiration
  /// duration is configured.
  pub fn sweep_interval(mut self, duration: Duration) -> Self {
    self.sweep_interval = Some(duration);
    self
  }

  /// Registers a listener that will observe cache events from the moment
  /// the cache is built. May be called multiple times; listeners are
  /// notified in registration order.
  pub fn listener<L>(mut self, listener: L) -> Self
  where
    L: CacheListener<K, V> + 'static,
  {
    self.listeners.push(Arc::new(listener));
    self
  }

  /// Sets a handler that receives the panic payload whenever a listener
  /// callback panics. Without one, listener panics are only logged and
  /// counted.
  pub fn listener_fault_handler(mut self, handler: ListenerFaultHandler) -> Self {
    self.fault_handler = Some(handler);
    self
  }
}

// --- Default Constructor ---
impl<K: Send, V: Send, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings: unbounded, no
  /// expiration, statistics enabled.
  pub fn new() -> Self {
    Self {
      capacity: None,
      shards: (num_cpus::get() * 4).max(1).next_power_of_two(),
      time_to_live: None,
      time_to_idle: None,
      hasher: H::default(),
      statistics: true,
      sweep_interval: None,
      policy: None,
      listeners: Vec::new(),
      fault_handler: None,
    }
  }
}

impl<K: Send, V: Send> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
// This impl block carries the full set of trait bounds required to actually
// construct the cache, including `K: Clone` for the eviction policies.
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Selects one of the built-in eviction policies.
  ///
  /// A bounded cache defaults to [`PolicyKind::Lru`] when no policy is
  /// chosen. Later calls to this method or to
  /// [`custom_policy`](CacheBuilder::custom_policy) replace earlier ones.
  pub fn eviction_policy(mut self, kind: PolicyKind) -> Self {
    self.policy = Some(kind.instantiate());
    self
  }

  /// Installs a user-supplied eviction policy.
  pub fn custom_policy<P>(mut self, policy: P) -> Self
  where
    P: EvictionPolicy<K> + 'static,
  {
    self.policy = Some(Box::new(policy));
    self
  }

  /// Sets the hasher for the cache.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Builds the cache, spawning the background sweeper if expiration is
  /// configured.
  pub fn build(mut self) -> Result<Cache<K, V, H>, BuildError> {
    self.validate()?;

    let policy = match self.policy.take() {
      Some(policy) => policy,
      // An unbounded cache needs no eviction bookkeeping. A bounded cache
      // defaults to LRU.
      None => match self.capacity {
        Some(_) => PolicyKind::Lru.instantiate(),
        None => Box::new(Unbounded::new()),
      },
    };

    let expiry = ExpiryPolicy {
      time_to_live: self.time_to_live,
      time_to_idle: self.time_to_idle,
    };
    let table = ShardTable::new(self.shards, self.hasher.clone());
    let num_shards = table.num_shards();

    let shared = Arc::new(CacheShared {
      table,
      policy,
      expiry,
      capacity: self.capacity,
      live: CachePadded::new(AtomicUsize::new(0)),
      stats: Stats::new(self.statistics),
      listeners: ListenerRegistry::new(std::mem::take(&mut self.listeners), self.fault_handler.take()),
      pending: PendingComputes::new(num_shards),
      janitor: OnceCell::new(),
    });

    if !expiry.is_disabled() {
      let tick = self.sweep_interval.unwrap_or(Duration::from_secs(1));
      let janitor = Janitor::spawn(Arc::downgrade(&shared), tick);
      // The cell is freshly created, so this cannot already be set.
      let _ = shared.janitor.set(janitor);
    }

    Ok(Cache { shared })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.capacity == Some(0) {
      return Err(BuildError::ZeroCapacity);
    }
    if self.shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    let durations = [self.time_to_live, self.time_to_idle, self.sweep_interval];
    if durations.iter().any(|d| matches!(d, Some(d) if d.is_zero())) {
      return Err(BuildError::ZeroDuration);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_capacity_is_rejected() {
    let result = CacheBuilder::<i32, i32, ahash::RandomState>::new()
      .maximum_size(0)
      .build();
    assert!(matches!(result, Err(BuildError::ZeroCapacity)));
  }

  #[test]
  fn zero_shards_are_rejected() {
    let result = CacheBuilder::<i32, i32, ahash::RandomState>::new()
      .shards(0)
      .build();
    assert!(matches!(result, Err(BuildError::ZeroShards)));
  }

  #[test]
  fn zero_expiration_durations_are_rejected() {
    let ttl = CacheBuilder::<i32, i32, ahash::RandomState>::new()
      .expire_after_write(Duration::ZERO)
      .build();
    assert!(matches!(ttl, Err(BuildError::ZeroDuration)));

    let tti = CacheBuilder::<i32, i32, ahash::RandomState>::new()
      .expire_after_access(Duration::ZERO)
      .build();
    assert!(matches!(tti, Err(BuildError::ZeroDuration)));

    let sweep = CacheBuilder::<i32, i32, ahash::RandomState>::new()
      .expire_after_write(Duration::from_secs(1))
      .sweep_interval(Duration::ZERO)
      .build();
    assert!(matches!(sweep, Err(BuildError::ZeroDuration)));
  }

  #[test]
  fn defaults_are_unbounded_with_stats() {
    let builder = CacheBuilder::<i32, i32, ahash::RandomState>::new();
    assert_eq!(builder.capacity, None);
    assert!(builder.statistics);
    assert!(builder.shards >= 1);
    assert!(builder.shards.is_power_of_two());
  }
}
