use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use cairn_cache::CacheBuilder;

#[test]
fn test_concurrent_compute_and_remove() {
  let cache = CacheBuilder::<i32, i32>::new()
    .maximum_size(10)
    .build()
    .unwrap();

  let num_loaders = 5;
  let barrier = Arc::new(Barrier::new(num_loaders + 1));
  let mut handles = vec![];

  // Spawn compute threads, all requesting the same key.
  for _ in 0..num_loaders {
    let cache_clone = cache.clone();
    let barrier_clone = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier_clone.wait();
      let value = cache_clone.get_with(1, || {
        thread::sleep(Duration::from_millis(50));
        10
      });
      // The compute may run once or, if the remover won the race, twice.
      // The key property is that every caller gets the value and nothing
      // deadlocks.
      assert_eq!(*value, 10);
    }));
  }

  // Spawn a remover thread to pull the key out mid-flight.
  let cache_clone = cache.clone();
  let barrier_clone = barrier.clone();
  handles.push(thread::spawn(move || {
    barrier_clone.wait();
    // It might be present or not depending on timing, so the return value
    // is not asserted.
    let _was_present = cache_clone.remove(&1);
  }));

  for handle in handles {
    handle.join().unwrap(); // Test passes if it doesn't hang or panic.
  }

  assert!(cache.stats().loads >= 1);
}

#[test]
fn test_concurrent_insert_and_clear() {
  let cache = CacheBuilder::<i32, i32>::new()
    .maximum_size(1_000_000)
    .build()
    .unwrap();
  let stop_inserting = Arc::new(AtomicBool::new(false));

  let cache_clone = cache.clone();
  let stop_clone = stop_inserting.clone();
  let insert_handle = thread::spawn(move || {
    for i in 0.. {
      // Loop indefinitely until stopped.
      if stop_clone.load(Ordering::Relaxed) {
        break;
      }
      cache_clone.put(i, i);
    }
  });

  let cache_clone_2 = cache.clone();
  let stop_clone_2 = stop_inserting.clone();
  let clear_handle = thread::spawn(move || {
    // Let the inserter run for a bit.
    thread::sleep(Duration::from_millis(20));
    cache_clone_2.invalidate_all();
    // Signal the inserter to stop *after* the wipe is done.
    stop_clone_2.store(true, Ordering::Relaxed);
  });

  insert_handle.join().unwrap();
  clear_handle.join().unwrap();

  // The count can be slightly above zero because an insert can begin
  // before the stop flag is checked. A threshold of 100 is more than
  // enough to absorb scheduling races.
  let final_len = cache.len();
  assert!(
    final_len < 100,
    "Expected a near-empty cache after the wipe, found {} entries",
    final_len
  );
}

#[test]
fn test_concurrent_mixed_traffic_respects_capacity() {
  const CAPACITY: usize = 100;
  const KEY_SPACE: i32 = 250;
  const OPS_PER_THREAD: i32 = 1_000;

  let cache = CacheBuilder::<i32, i32>::new()
    .maximum_size(CAPACITY)
    .build()
    .unwrap();

  let num_threads = 6;
  let barrier = Arc::new(Barrier::new(num_threads));
  let mut handles = vec![];

  // Three writers cycling over a shared key space.
  for t in 0..3 {
    let cache_clone = cache.clone();
    let barrier_clone = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier_clone.wait();
      for i in 0..OPS_PER_THREAD {
        let key = (i + t * 83) % KEY_SPACE;
        cache_clone.put(key, key * 2);
      }
    }));
  }

  // Two readers probing the same key space.
  for _ in 0..2 {
    let cache_clone = cache.clone();
    let barrier_clone = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier_clone.wait();
      for i in 0..OPS_PER_THREAD {
        let key = (i * 7) % KEY_SPACE;
        if let Some(value) = cache_clone.get(&key) {
          // A resident value is always the one its writer stored.
          assert_eq!(*value, key * 2);
        }
      }
    }));
  }

  // One remover thinning the same key space.
  {
    let cache_clone = cache.clone();
    let barrier_clone = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier_clone.wait();
      for i in 0..OPS_PER_THREAD {
        let key = (i * 13) % KEY_SPACE;
        cache_clone.remove(&key);
      }
    }));
  }

  for handle in handles {
    handle.join().unwrap();
  }

  // Eviction is synchronous, so once every writer has returned the bound
  // holds again.
  assert!(
    cache.len() <= CAPACITY,
    "Cache holds {} entries, capacity is {}",
    cache.len(),
    CAPACITY
  );
  assert!(cache.stats().evictions > 0);
}
