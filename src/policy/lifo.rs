use super::order_list::OrderList;
use super::EvictionPolicy;

use parking_lot::Mutex;
use std::hash::Hash;

/// An eviction policy that evicts entries in a Last-In, First-Out (LIFO)
/// manner: the newest insertion is the first victim. Access order is ignored.
///
/// Under sustained inserts at capacity this keeps the oldest entries resident
/// and churns the newest, which is the point of the policy.
#[derive(Debug)]
pub struct Lifo<K: Eq + Hash + Clone> {
  list: Mutex<OrderList<K>>,
}

impl<K: Eq + Hash + Clone> Lifo<K> {
  pub fn new() -> Self {
    Self {
      list: Mutex::new(OrderList::new()),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Lifo<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Lifo<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// A LIFO policy does not care about access patterns. This is a no-op.
  fn on_access(&self, _key: &K) {}

  /// On insert, add the new item to the front of the stack.
  fn on_insert(&self, key: K) {
    let mut list = self.list.lock();

    // A re-inserted key keeps its original position.
    if !list.contains(&key) {
      list.push_front(key);
    }
  }

  /// When an item is removed, stop tracking it.
  fn on_remove(&self, key: &K) {
    self.list.lock().remove(key);
  }

  /// The newest insertion sits at the head of the stack.
  fn select_victim(&self) -> Option<K> {
    self.list.lock().front()
  }

  /// Clear all internal tracking.
  fn clear(&self) {
    self.list.lock().clear();
  }
}
