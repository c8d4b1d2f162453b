use super::order_list::OrderList;
use super::EvictionPolicy;

use parking_lot::Mutex;
use std::hash::Hash;

/// An eviction policy that evicts entries in a First-In, First-Out (FIFO)
/// manner. Access order is ignored.
#[derive(Debug)]
pub struct Fifo<K: Eq + Hash + Clone> {
  list: Mutex<OrderList<K>>,
}

impl<K: Eq + Hash + Clone> Fifo<K> {
  pub fn new() -> Self {
    Self {
      list: Mutex::new(OrderList::new()),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Fifo<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Fifo<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// A FIFO policy does not care about access patterns. This is a no-op.
  fn on_access(&self, _key: &K) {}

  /// On insert, add the new item to the front of the queue.
  fn on_insert(&self, key: K) {
    let mut list = self.list.lock();

    // If the key is already tracked, keep its original position. This
    // preserves the "First-In" part of the name.
    if !list.contains(&key) {
      list.push_front(key);
    }
  }

  /// When an item is removed, stop tracking it.
  fn on_remove(&self, key: &K) {
    self.list.lock().remove(key);
  }

  /// The oldest insertion sits at the tail of the queue.
  fn select_victim(&self) -> Option<K> {
    self.list.lock().back()
  }

  /// Clear all internal tracking.
  fn clear(&self) {
    self.list.lock().clear();
  }
}
