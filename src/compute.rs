use crate::error::LoadError;

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, Thread};

/// The internal state of a value being computed.
enum SlotState<V> {
  Computing,
  Complete(Arc<V>),
  Failed(LoadError),
}

/// The internal, mutex-protected core of a `ComputeSlot`.
struct SlotInner<V> {
  state: SlotState<V>,
  waiters: VecDeque<Thread>,
}

/// A rendezvous point for a value being computed for the cache.
///
/// One thread (the leader) runs the computation while any number of other
/// threads block on [`wait`](ComputeSlot::wait) for the outcome. The leader
/// settles the slot exactly once with [`complete`](ComputeSlot::complete) or
/// [`fail`](ComputeSlot::fail), which wakes every parked waiter.
pub(crate) struct ComputeSlot<V> {
  inner: Mutex<SlotInner<V>>,
}

impl<V> ComputeSlot<V> {
  /// Creates a new `ComputeSlot` in the "Computing" state.
  pub(crate) fn new() -> Self {
    Self {
      inner: Mutex::new(SlotInner {
        state: SlotState::Computing,
        waiters: VecDeque::new(),
      }),
    }
  }

  /// Blocks the calling thread until the slot is settled.
  pub(crate) fn wait(&self) -> Result<Arc<V>, LoadError> {
    loop {
      {
        let mut inner = self.inner.lock();
        match &inner.state {
          SlotState::Complete(value) => return Ok(value.clone()),
          SlotState::Failed(error) => return Err(error.clone()),
          SlotState::Computing => {
            inner.waiters.push_back(thread::current());
          }
        }
      } // Lock is dropped here.

      // A spurious unpark sends us back around the loop, where the state
      // check decides whether to park again.
      thread::park();
    }
  }

  /// Completes the slot with a value, waking all waiters.
  pub(crate) fn complete(&self, value: Arc<V>) {
    let mut inner = self.inner.lock();
    inner.state = SlotState::Complete(value);
    for waiter in inner.waiters.drain(..) {
      waiter.unpark();
    }
  }

  /// Fails the slot with an error, waking all waiters.
  pub(crate) fn fail(&self, error: LoadError) {
    let mut inner = self.inner.lock();
    inner.state = SlotState::Failed(error);
    for waiter in inner.waiters.drain(..) {
      waiter.unpark();
    }
  }
}

/// The in-flight computations, partitioned like the entry table.
///
/// Slot maps are indexed with [`ShardTable::shard_index`](crate::table::ShardTable::shard_index)
/// so a key's entry shard and its pending computation are guarded by locks in
/// the same position. The slot mutex is always taken before the entry shard
/// lock, never while holding it.
pub(crate) struct PendingComputes<K, V> {
  slots: Box<[Mutex<HashMap<K, Arc<ComputeSlot<V>>>>]>,
}

impl<K: Eq + Hash, V> PendingComputes<K, V> {
  pub(crate) fn new(num_shards: usize) -> Self {
    let mut slots = Vec::with_capacity(num_shards);
    for _ in 0..num_shards {
      slots.push(Mutex::new(HashMap::new()));
    }
    Self {
      slots: slots.into_boxed_slice(),
    }
  }

  #[inline]
  pub(crate) fn slot(&self, index: usize) -> &Mutex<HashMap<K, Arc<ComputeSlot<V>>>> {
    &self.slots[index]
  }
}
