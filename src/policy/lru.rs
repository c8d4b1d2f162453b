use super::order_list::OrderList;
use super::EvictionPolicy;

use parking_lot::Mutex;
use std::hash::Hash;

/// An eviction policy that evicts the Least Recently Used (LRU) entry.
#[derive(Debug)]
pub struct Lru<K: Eq + Hash + Clone> {
  list: Mutex<OrderList<K>>,
}

impl<K: Eq + Hash + Clone> Lru<K> {
  pub fn new() -> Self {
    Self {
      list: Mutex::new(OrderList::new()),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Lru<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Lru<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// An access makes the key the most recently used.
  fn on_access(&self, key: &K) {
    self.list.lock().move_to_front(key);
  }

  /// A new key starts as the most recently used.
  fn on_insert(&self, key: K) {
    self.list.lock().push_front(key);
  }

  /// When an item is removed, stop tracking it.
  fn on_remove(&self, key: &K) {
    self.list.lock().remove(key);
  }

  /// The least recently used key sits at the tail of the list.
  fn select_victim(&self) -> Option<K> {
    self.list.lock().back()
  }

  /// Clear all internal tracking.
  fn clear(&self) {
    self.list.lock().clear();
  }
}
