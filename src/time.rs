use once_cell::sync::Lazy;
use std::time::Instant;

// The single, static reference point for all time calculations in the cache.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Returns the current time as nanoseconds since the cache's epoch.
///
/// All entry timestamps and expiration deadlines are expressed in this
/// representation so that comparisons are plain integer arithmetic.
#[inline]
pub(crate) fn now_nanos() -> u64 {
  Instant::now().saturating_duration_since(*CACHE_EPOCH).as_nanos() as u64
}
