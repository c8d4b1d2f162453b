use crate::shared::CacheShared;

use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The background task responsible for periodic expiration sweeps.
///
/// The thread holds only a `Weak` reference to the cache core, so it never
/// keeps a dropped cache alive. It exits when the last cache handle is gone
/// or when the `Janitor` itself is dropped.
pub(crate) struct Janitor {
  stop_flag: Arc<AtomicBool>,
  handle: JoinHandle<()>,
}

impl Janitor {
  /// Spawns a new janitor thread that sweeps the cache every `tick_interval`.
  pub(crate) fn spawn<K, V, H>(shared: Weak<CacheShared<K, V, H>>, tick_interval: Duration) -> Self
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: BuildHasher + Clone + Send + Sync + 'static,
  {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_clone = stop_flag.clone();

    let handle = thread::spawn(move || {
      while !stop_clone.load(Ordering::Relaxed) {
        let tick_start = Instant::now();

        match shared.upgrade() {
          Some(shared) => shared.sweep(),
          // Every cache handle is gone; nothing left to sweep.
          None => break,
        }

        // Park for the remaining duration of the tick interval. A stopping
        // cache unparks us early.
        if let Some(remaining) = tick_interval.checked_sub(tick_start.elapsed()) {
          thread::park_timeout(remaining);
        }
      }
    });

    Self { stop_flag, handle }
  }
}

impl Drop for Janitor {
  fn drop(&mut self) {
    self.stop_flag.store(true, Ordering::Relaxed);
    // Wake the thread if it is parked so it exits now rather than at the
    // next tick boundary. The thread is not joined: the sweep itself can
    // briefly hold the last cache handle, and a self-join would deadlock.
    self.handle.thread().unpark();
  }
}
