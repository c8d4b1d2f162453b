use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Describes why an entry left the cache, attached to every removal
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The entry was removed because the cache exceeded its maximum size.
  Size,
  /// The entry was removed because its TTL or TTI deadline passed.
  Expired,
  /// The entry was removed by an explicit call to `remove`.
  Explicit,
  /// The entry's value was overwritten by a `put` for the same key.
  Replaced,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Size => write!(f, "evicted due to capacity"),
      EvictionReason::Expired => write!(f, "evicted due to expiration (TTL/TTI)"),
      EvictionReason::Explicit => write!(f, "manually removed"),
      EvictionReason::Replaced => write!(f, "value replaced"),
    }
  }
}

/// A listener that can be registered with the cache to observe entry
/// lifecycle events.
///
/// Dispatch is synchronous: callbacks run on the thread performing the
/// triggering operation, in registration order, after the table mutation is
/// already committed. A panicking listener never aborts the operation or
/// prevents later listeners from running; the panic is counted, reported
/// through `log::error!`, and forwarded to the configured fault handler,
/// if any.
///
/// All methods have empty default bodies, so an implementation only needs
/// the events it cares about.
pub trait CacheListener<K, V>: Send + Sync {
  /// A value was inserted for `key`, either fresh or replacing an old one.
  fn on_put(&self, key: &K, value: &Arc<V>) {
    let _ = (key, value);
  }

  /// `key` was explicitly removed by the caller.
  fn on_remove(&self, key: &K, value: &Arc<V>) {
    let _ = (key, value);
  }

  /// `key` was removed by the cache itself; `reason` says why.
  fn on_evict(&self, key: &K, value: &Arc<V>, reason: EvictionReason) {
    let _ = (key, value, reason);
  }
}

/// Opaque handle identifying a registered listener, returned by
/// `add_listener` and consumed by `remove_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A handler invoked with the panic payload whenever a listener panics
/// during dispatch.
pub type ListenerFaultHandler = Arc<dyn Fn(&(dyn Any + Send)) + Send + Sync>;

/// The ordered set of registered listeners, plus the fault-isolation
/// machinery around dispatch.
pub(crate) struct ListenerRegistry<K, V> {
  listeners: RwLock<Vec<(ListenerId, Arc<dyn CacheListener<K, V>>)>>,
  next_id: AtomicU64,
  // Kept outside the lock so the hot path can skip dispatch entirely
  // when nothing is registered.
  active: AtomicUsize,
  faults: AtomicU64,
  fault_handler: Option<ListenerFaultHandler>,
}

impl<K, V> ListenerRegistry<K, V> {
  pub(crate) fn new(
    initial: Vec<Arc<dyn CacheListener<K, V>>>,
    fault_handler: Option<ListenerFaultHandler>,
  ) -> Self {
    let registry = Self {
      listeners: RwLock::new(Vec::new()),
      next_id: AtomicU64::new(0),
      active: AtomicUsize::new(0),
      faults: AtomicU64::new(0),
      fault_handler,
    };
    for listener in initial {
      registry.add(listener);
    }
    registry
  }

  pub(crate) fn add(&self, listener: Arc<dyn CacheListener<K, V>>) -> ListenerId {
    let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
    let mut listeners = self.listeners.write();
    listeners.push((id, listener));
    self.active.store(listeners.len(), Ordering::Relaxed);
    id
  }

  pub(crate) fn remove(&self, id: ListenerId) -> bool {
    let mut listeners = self.listeners.write();
    let before = listeners.len();
    listeners.retain(|(registered, _)| *registered != id);
    self.active.store(listeners.len(), Ordering::Relaxed);
    listeners.len() != before
  }

  pub(crate) fn fault_count(&self) -> u64 {
    self.faults.load(Ordering::Relaxed)
  }

  pub(crate) fn emit_put(&self, key: &K, value: &Arc<V>) {
    self.each(|listener| listener.on_put(key, value));
  }

  pub(crate) fn emit_remove(&self, key: &K, value: &Arc<V>) {
    self.each(|listener| listener.on_remove(key, value));
  }

  pub(crate) fn emit_evict(&self, key: &K, value: &Arc<V>, reason: EvictionReason) {
    self.each(|listener| listener.on_evict(key, value, reason));
  }

  /// Runs `f` against every registered listener in registration order,
  /// isolating panics per listener.
  fn each<F>(&self, f: F)
  where
    F: Fn(&dyn CacheListener<K, V>),
  {
    if self.active.load(Ordering::Relaxed) == 0 {
      return;
    }

    // Snapshot the registration list so user callbacks never run while the
    // registry lock is held; a callback is then free to add or remove
    // listeners itself.
    let snapshot: Vec<Arc<dyn CacheListener<K, V>>> = self
      .listeners
      .read()
      .iter()
      .map(|(_, listener)| listener.clone())
      .collect();

    for listener in snapshot {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        log::error!("cache listener panicked: {}", panic_message(payload.as_ref()));
        if let Some(handler) = &self.fault_handler {
          // A faulty handler must not take down the operation either.
          let _ = panic::catch_unwind(AssertUnwindSafe(|| handler(payload.as_ref())));
        }
      }
    }
  }
}

impl<K, V> fmt::Debug for ListenerRegistry<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ListenerRegistry")
      .field("listeners", &self.active.load(Ordering::Relaxed))
      .field("faults", &self.faults.load(Ordering::Relaxed))
      .finish()
  }
}

/// Extracts a printable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "non-string panic payload"
  }
}
