use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The cache was configured with a capacity of zero, which is not allowed
  /// for a bounded cache. Leave the size unset for an unbounded cache.
  #[error("bounded cache capacity cannot be zero")]
  ZeroCapacity,
  /// The cache was configured with zero shards, which is not allowed.
  #[error("shard count cannot be zero")]
  ZeroShards,
  /// An expiration or sweep duration was set to zero.
  #[error("expiration and sweep durations cannot be zero")]
  ZeroDuration,
}

/// The error returned by `get_or_compute` when a compute episode fails.
///
/// Every caller waiting on the same episode receives a clone of the same
/// error; clones share one underlying source, so the failure observed by a
/// waiter is exactly the failure the computing closure produced.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
  /// The computing closure returned an error.
  #[error("cache load failed: {0}")]
  Failed(Arc<dyn Error + Send + Sync>),
  /// The computing closure panicked on the thread running it. The panic
  /// itself resumes on that thread; waiters observe this variant instead.
  #[error("cache load computation panicked")]
  Panicked,
}

impl LoadError {
  pub(crate) fn failed<E>(error: E) -> Self
  where
    E: Error + Send + Sync + 'static,
  {
    LoadError::Failed(Arc::new(error))
  }

  /// Returns the error produced by the computing closure, when there is one.
  pub fn inner(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
    match self {
      LoadError::Failed(source) => Some(source.as_ref()),
      LoadError::Panicked => None,
    }
  }
}
