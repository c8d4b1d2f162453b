mod common;
use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cairn_cache::{Cache, CacheBuilder};

use crate::common::{build_test_cache, ShardControllingHasher};

#[test]
fn snapshot_iter_visits_all_items() {
  let cache = build_test_cache(4);
  let mut expected = HashSet::new();

  for i in 0..100 {
    let value = i.to_string();
    cache.put(i, value.clone());
    expected.insert((i, Arc::new(value)));
  }

  let collected: HashSet<_> = cache.entries().collect();
  assert_eq!(collected, expected);
}

#[test]
fn snapshot_iter_misses_insert_after_shard_scan() {
  let cache = build_test_cache(4);

  // Pre-populate shards 0 and 2.
  cache.put(0, "a".to_string()); // Shard 0
  cache.put(2, "b".to_string()); // Shard 2

  let writer = cache.clone();
  let thread_handle = thread::spawn(move || {
    // This insert will happen after the main thread's iterator
    // has snapshotted the keys for shard 0.
    thread::sleep(Duration::from_millis(50));
    writer.put(4, "new".to_string()); // Also in shard 0
  });

  let collected: Vec<_> = cache.entries().collect();

  thread_handle.join().unwrap();

  assert_eq!(collected.len(), 2, "Should only see the original 2 items");
  assert!(
    !collected.iter().any(|(k, _)| *k == 4),
    "Should miss item inserted into a past shard"
  );
}

#[test]
fn snapshot_iter_sees_insert_before_shard_scan() {
  let cache = build_test_cache(4);
  // Channels for two-way synchronization.
  let (go_tx, go_rx) = mpsc::sync_channel::<()>(1);
  let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);

  // Pre-populate shard 0.
  cache.put(0, "a".to_string());

  let writer = cache.clone();
  let thread_handle = thread::spawn(move || {
    // Wait for the signal from the iterator.
    go_rx.recv().unwrap();
    // Insert into a future shard (Shard 2).
    writer.put(2, "new".to_string());
    // Signal that the insert is complete.
    done_tx.send(()).unwrap();
  });

  let mut collected = Vec::new();
  let mut iter = cache.entries();

  // 1. Manually process the first item from Shard 0.
  if let Some(item) = iter.next() {
    collected.push(item);
  }

  // 2. We now know Shard 0 has been snapshotted.
  //    Signal the writer thread and wait for it to finish.
  go_tx.send(()).unwrap();
  done_rx.recv().unwrap();

  // 3. Continue iterating. The iterator moves on to Shard 1 and then
  //    Shard 2, where it sees the newly inserted item.
  for item in iter {
    collected.push(item);
  }

  thread_handle.join().unwrap();

  assert_eq!(
    collected.len(),
    2,
    "Should see the original and the new item"
  );
  assert!(
    collected.iter().any(|(k, _)| *k == 2),
    "Should see item inserted into a future shard"
  );
}

#[test]
fn snapshot_iter_skips_deleted_item() {
  let cache = build_test_cache(4);
  // Channels for two-way synchronization.
  let (go_tx, go_rx) = mpsc::sync_channel::<()>(1);
  let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);

  cache.put(0, "a".to_string()); // Shard 0
  cache.put(1, "b".to_string()); // Shard 1

  let writer = cache.clone();
  let thread_handle = thread::spawn(move || {
    // Wait for the signal from the iterator.
    go_rx.recv().unwrap();
    // Remove an item out from under the iterator.
    writer.remove(&0);
    // Signal that the removal is complete.
    done_tx.send(()).unwrap();
  });

  let iter = cache.entries();

  // Signal the writer thread to delete key 0, then wait for it.
  go_tx.send(()).unwrap();
  done_rx.recv().unwrap();

  // Consume the iterator. Whether or not shard 0's keys were snapshotted
  // before the removal, the value fetch for key 0 comes up empty and the
  // iterator skips it.
  let collected: Vec<_> = iter.collect();

  thread_handle.join().unwrap();

  assert_eq!(
    collected.len(),
    1,
    "Should only collect the item that was not deleted"
  );
  assert_eq!(collected[0].0, 1, "The remaining item should be key 1");
}

#[test]
fn snapshot_iter_skips_expired_items() {
  let cache: Cache<i32, String, ShardControllingHasher> = CacheBuilder::new()
    .shards(4)
    .hasher(ShardControllingHasher)
    .expire_after_write(Duration::from_millis(100))
    // Keep the sweeper out of the picture so the dead entries are still
    // resident when we iterate.
    .sweep_interval(Duration::from_secs(3_600))
    .build()
    .unwrap();

  cache.put(0, "a".to_string()); // Shard 0
  cache.put(2, "b".to_string()); // Shard 2

  thread::sleep(Duration::from_millis(250));

  // The corpses still occupy their shards, but iteration filters them.
  assert_eq!(cache.len(), 2);
  assert_eq!(cache.entries().count(), 0);
}

#[test]
fn key_and_value_iterators_mirror_the_entries() {
  let cache = build_test_cache(4);
  for i in 0..10 {
    cache.put(i, (i * 100).to_string());
  }

  let keys: HashSet<i32> = cache.keys().collect();
  assert_eq!(keys, (0..10).collect::<HashSet<_>>());

  let values: HashSet<String> = cache.values().map(|v| v.as_str().to_string()).collect();
  let expected: HashSet<String> = (0..10).map(|i| (i * 100).to_string()).collect();
  assert_eq!(values, expected);
}
