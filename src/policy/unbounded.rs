use super::EvictionPolicy;

/// A no-op policy for caches without a capacity bound.
///
/// It tracks nothing and never names a victim. A cache using it only loses
/// entries to expiration or explicit removal.
#[derive(Debug, Default)]
pub struct Unbounded;

impl Unbounded {
  pub fn new() -> Self {
    Self
  }
}

impl<K: Send + Sync> EvictionPolicy<K> for Unbounded {
  fn on_access(&self, _key: &K) {}

  fn on_insert(&self, _key: K) {}

  fn on_remove(&self, _key: &K) {}

  fn select_victim(&self) -> Option<K> {
    None
  }

  fn clear(&self) {}
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn never_names_a_victim() {
    let policy = Unbounded::new();
    EvictionPolicy::<i32>::on_insert(&policy, 1);
    EvictionPolicy::<i32>::on_insert(&policy, 2);

    assert_eq!(EvictionPolicy::<i32>::select_victim(&policy), None);
  }
}
