use std::collections::HashMap;
use std::hash::Hash;

use generational_arena::{Arena, Index};

#[derive(Debug)]
struct Node<K> {
  key: K,
  next: Option<Index>,
  prev: Option<Index>,
}

/// A doubly-linked list of keys with O(1) lookup, used as the ordering
/// structure behind the recency- and insertion-ordered policies.
///
/// The head is the most-recent end, the tail the least-recent end. Which
/// end a policy evicts from is its own business.
#[derive(Debug)]
pub(super) struct OrderList<K: Eq + Hash + Clone> {
  // Arena stores all nodes contiguously.
  nodes: Arena<Node<K>>,
  // HashMap for O(1) lookup of a key to its node index in the arena.
  lookup: HashMap<K, Index>,
  head: Option<Index>,
  tail: Option<Index>,
}

impl<K: Eq + Hash + Clone> OrderList<K> {
  pub fn new() -> Self {
    Self {
      nodes: Arena::new(),
      lookup: HashMap::new(),
      head: None,
      tail: None,
    }
  }

  // Helper to unlink a node from the list.
  // It does not touch the arena or the lookup map.
  fn unlink(&mut self, index: Index) {
    let node = &self.nodes[index];
    let prev_node_idx = node.prev;
    let next_node_idx = node.next;

    // Update the 'next' pointer of the previous node.
    if let Some(prev_idx) = prev_node_idx {
      self.nodes[prev_idx].next = next_node_idx;
    } else {
      // We are unlinking the head of the list.
      self.head = next_node_idx;
    }

    // Update the 'prev' pointer of the next node.
    if let Some(next_idx) = next_node_idx {
      self.nodes[next_idx].prev = prev_node_idx;
    } else {
      // We are unlinking the tail of the list.
      self.tail = prev_node_idx;
    }
  }

  // Helper to push an already-allocated node to the front.
  fn push_front_node(&mut self, index: Index) {
    let old_head_idx = self.head;
    self.nodes[index].next = old_head_idx;
    self.nodes[index].prev = None;
    self.head = Some(index);

    if let Some(old_head) = old_head_idx {
      self.nodes[old_head].prev = Some(index);
    }

    if self.tail.is_none() {
      self.tail = Some(index);
    }
  }

  pub fn contains(&self, key: &K) -> bool {
    self.lookup.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.lookup.len()
  }

  /// Inserts `key` at the most-recent end, or moves it there if already
  /// tracked.
  pub fn push_front(&mut self, key: K) {
    if self.lookup.contains_key(&key) {
      self.move_to_front(&key);
    } else {
      let new_node = Node {
        key: key.clone(),
        next: None,
        prev: None,
      };
      let index = self.nodes.insert(new_node);
      self.lookup.insert(key, index);
      self.push_front_node(index);
    }
  }

  pub fn move_to_front(&mut self, key: &K) {
    if let Some(&index) = self.lookup.get(key) {
      // Only move if it's not already the head.
      if self.head != Some(index) {
        self.unlink(index);
        self.push_front_node(index);
      }
    }
  }

  /// The key at the most-recent end, without removing it.
  pub fn front(&self) -> Option<K> {
    self.head.map(|index| self.nodes[index].key.clone())
  }

  /// The key at the least-recent end, without removing it.
  pub fn back(&self) -> Option<K> {
    self.tail.map(|index| self.nodes[index].key.clone())
  }

  pub fn remove(&mut self, key: &K) -> bool {
    if let Some(index) = self.lookup.remove(key) {
      self.unlink(index);
      self.nodes.remove(index);
      true
    } else {
      false
    }
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.lookup.clear();
    self.head = None;
    self.tail = None;
  }

  // A helper for tests, to get the order of keys from head to tail.
  #[cfg(test)]
  pub(crate) fn keys_as_vec(&self) -> Vec<K> {
    let mut keys = Vec::new();
    let mut current = self.head;
    while let Some(index) = current {
      keys.push(self.nodes[index].key.clone());
      current = self.nodes[index].next;
    }
    keys
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_list_is_empty() {
    let list = OrderList::<i32>::new();
    assert!(list.keys_as_vec().is_empty(), "new list should be empty");
    assert_eq!(list.len(), 0);
    assert_eq!(list.front(), None);
    assert_eq!(list.back(), None);
    assert!(!list.contains(&123));
  }

  #[test]
  fn push_front_orders_newest_first() {
    let mut list = OrderList::new();
    list.push_front(10);
    list.push_front(20);

    assert_eq!(list.len(), 2);
    assert_eq!(
      list.keys_as_vec(),
      vec![20, 10],
      "newest item should be at the front"
    );
    assert_eq!(list.front(), Some(20));
    assert_eq!(list.back(), Some(10));
  }

  #[test]
  fn push_front_existing_item_moves_to_front() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);
    assert_eq!(list.keys_as_vec(), vec![3, 2, 1]);

    // Re-push '1' (the tail item). It should move to the front.
    list.push_front(1);
    assert_eq!(list.len(), 3, "length should not change");
    assert_eq!(
      list.keys_as_vec(),
      vec![1, 3, 2],
      "existing item should move to front"
    );
  }

  #[test]
  fn move_to_front_from_middle() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);

    list.move_to_front(&2);
    assert_eq!(list.keys_as_vec(), vec![2, 3, 1]);
    assert_eq!(list.back(), Some(1));
  }

  #[test]
  fn move_to_front_of_head_is_a_noop() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);

    list.move_to_front(&2);
    assert_eq!(list.keys_as_vec(), vec![2, 1]);
  }

  #[test]
  fn remove_item_from_middle() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);

    assert!(list.remove(&2));
    assert!(!list.contains(&2));
    assert_eq!(list.len(), 2);
    assert_eq!(list.keys_as_vec(), vec![3, 1]);
  }

  #[test]
  fn remove_head_and_tail_update_ends() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);

    assert!(list.remove(&3));
    assert_eq!(list.front(), Some(2));
    assert!(list.remove(&1));
    assert_eq!(list.back(), Some(2));
    assert_eq!(list.keys_as_vec(), vec![2]);
  }

  #[test]
  fn remove_non_existent_item() {
    let mut list = OrderList::new();
    list.push_front(1);

    assert!(!list.remove(&99));
    assert_eq!(list.len(), 1, "length should not change");
  }

  #[test]
  fn remove_last_item_empties_list() {
    let mut list = OrderList::new();
    list.push_front(1);

    assert!(list.remove(&1));
    assert_eq!(list.front(), None);
    assert_eq!(list.back(), None);
    assert!(list.keys_as_vec().is_empty());
  }

  #[test]
  fn clear_resets_list() {
    let mut list = OrderList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);

    list.clear();

    assert!(list.keys_as_vec().is_empty());
    assert_eq!(list.len(), 0);
    assert!(!list.contains(&1));
    assert_eq!(list.back(), None);
  }
}
