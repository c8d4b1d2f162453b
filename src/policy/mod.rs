pub mod fifo;
pub mod lfu;
pub mod lifo;
pub mod lru;
pub mod mru;
pub mod unbounded;

mod order_list;

use std::hash::Hash;

/// A trait for implementing cache eviction policies.
///
/// The policy tracks key usage and names which key to evict when the cache is
/// over capacity. It never touches stored values: the cache owns the actual
/// removal and reports it back through [`on_remove`](EvictionPolicy::on_remove).
///
/// Implementations use interior mutability; every method takes `&self` and may
/// be called concurrently from any thread.
pub trait EvictionPolicy<K>: Send + Sync {
  /// Called when a tracked key is read or overwritten.
  /// A key the policy does not track is ignored.
  fn on_access(&self, key: &K);

  /// Called when a new key is admitted into the cache.
  fn on_insert(&self, key: K);

  /// Called after a key leaves the cache for any reason, including an
  /// eviction the policy itself proposed. The policy must drop all state
  /// associated with the key.
  fn on_remove(&self, key: &K);

  /// Names the next eviction candidate, without removing it.
  ///
  /// The cache removes the entry itself and then calls
  /// [`on_remove`](EvictionPolicy::on_remove). Returning `None` tells the
  /// cache the policy tracks nothing evictable.
  fn select_victim(&self) -> Option<K>;

  /// Clears all state from the policy.
  fn clear(&self);
}

/// Selector for the built-in eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
  /// Evicts the least recently accessed key.
  Lru,
  /// Evicts the oldest inserted key. Reads do not affect the order.
  Fifo,
  /// Evicts the newest inserted key. Reads do not affect the order.
  Lifo,
  /// Evicts the least frequently accessed key, breaking ties by age.
  Lfu,
  /// Evicts the most recently accessed key.
  Mru,
}

impl PolicyKind {
  pub(crate) fn instantiate<K>(self) -> Box<dyn EvictionPolicy<K>>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
  {
    match self {
      PolicyKind::Lru => Box::new(lru::Lru::new()),
      PolicyKind::Fifo => Box::new(fifo::Fifo::new()),
      PolicyKind::Lifo => Box::new(lifo::Lifo::new()),
      PolicyKind::Lfu => Box::new(lfu::Lfu::new()),
      PolicyKind::Mru => Box::new(mru::Mru::new()),
    }
  }
}
