use super::EvictionPolicy;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Per-key usage tracking: how often the key was touched, and when it was
/// first admitted relative to its peers.
#[derive(Debug, Clone, Copy)]
struct Usage {
  count: u64,
  seq: u64,
}

#[derive(Debug)]
struct LfuState<K> {
  entries: HashMap<K, Usage>,
  next_seq: u64,
}

/// An eviction policy that evicts the Least Frequently Used (LFU) entry.
///
/// Victim selection scans all tracked keys for the smallest access count,
/// breaking ties toward the earliest admitted key. The scan is O(n) in the
/// number of resident entries, which is acceptable because it only runs when
/// the cache is over capacity.
#[derive(Debug)]
pub struct Lfu<K: Eq + Hash + Clone> {
  state: Mutex<LfuState<K>>,
}

impl<K: Eq + Hash + Clone> Lfu<K> {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(LfuState {
        entries: HashMap::new(),
        next_seq: 0,
      }),
    }
  }
}

impl<K: Eq + Hash + Clone> Default for Lfu<K> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K> EvictionPolicy<K> for Lfu<K>
where
  K: Eq + Hash + Clone + Send + Sync,
{
  /// An access bumps the key's frequency count.
  fn on_access(&self, key: &K) {
    let mut state = self.state.lock();
    if let Some(usage) = state.entries.get_mut(key) {
      usage.count = usage.count.saturating_add(1);
    }
  }

  /// A new key starts with a count of one.
  fn on_insert(&self, key: K) {
    let mut state = self.state.lock();
    let seq = state.next_seq;
    // A key that is already tracked keeps its accumulated count.
    state.entries.entry(key).or_insert(Usage { count: 1, seq });
    state.next_seq += 1;
  }

  /// When an item is removed, stop tracking it.
  fn on_remove(&self, key: &K) {
    self.state.lock().entries.remove(key);
  }

  /// Scans for the smallest `(count, seq)` pair.
  fn select_victim(&self) -> Option<K> {
    let state = self.state.lock();
    state
      .entries
      .iter()
      .min_by_key(|(_, usage)| (usage.count, usage.seq))
      .map(|(key, _)| key.clone())
  }

  /// Clear all internal tracking.
  fn clear(&self) {
    let mut state = self.state.lock();
    state.entries.clear();
    state.next_seq = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn victim_is_least_frequently_used() {
    let policy = Lfu::new();
    policy.on_insert(1);
    policy.on_insert(2);
    policy.on_insert(3);

    // Key 1 is touched twice, key 3 once. Key 2 stays at its insert count.
    policy.on_access(&1);
    policy.on_access(&1);
    policy.on_access(&3);

    assert_eq!(policy.select_victim(), Some(2));
  }

  #[test]
  fn frequency_ties_break_toward_the_oldest_key() {
    let policy = Lfu::new();
    policy.on_insert(1); // Oldest
    policy.on_insert(2);
    policy.on_insert(3); // Newest

    // All counts are equal, so the earliest admitted key loses.
    assert_eq!(policy.select_victim(), Some(1));
  }

  #[test]
  fn access_to_untracked_key_is_a_noop() {
    let policy = Lfu::new();
    policy.on_insert(1);

    policy.on_access(&99);

    assert_eq!(policy.state.lock().entries.len(), 1);
  }

  #[test]
  fn removed_key_is_no_longer_a_candidate() {
    let policy = Lfu::new();
    policy.on_insert(1);
    policy.on_insert(2);
    policy.on_access(&2);

    assert_eq!(policy.select_victim(), Some(1));
    policy.on_remove(&1);
    assert_eq!(policy.select_victim(), Some(2));
  }

  #[test]
  fn heavily_used_key_survives_churn() {
    let policy = Lfu::new();
    policy.on_insert(1);
    for _ in 0..10 {
      policy.on_access(&1);
    }

    for k in 2..=5 {
      policy.on_insert(k);
    }

    // Evict three times. Key 1 must never be selected.
    for _ in 0..3 {
      let victim = policy.select_victim().unwrap();
      assert_ne!(victim, 1, "hot key should not be evicted");
      policy.on_remove(&victim);
    }
  }

  #[test]
  fn clear_resets_counts_and_sequence() {
    let policy = Lfu::new();
    policy.on_insert(1);
    policy.on_access(&1);
    policy.clear();

    assert_eq!(policy.select_victim(), None);

    // After a clear, admission order starts over.
    policy.on_insert(7);
    policy.on_insert(8);
    assert_eq!(policy.select_victim(), Some(7));
  }
}
