use std::time::Duration;

/// The expiration windows configured for a cache.
///
/// Both clocks are optional and independent: time-to-live measures from the
/// last write, time-to-idle measures from the last access. An entry is
/// expired as soon as either configured deadline has passed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExpiryPolicy {
  /// Maximum age since the last write.
  pub(crate) time_to_live: Option<Duration>,
  /// Maximum age since the last read or write.
  pub(crate) time_to_idle: Option<Duration>,
}

impl ExpiryPolicy {
  /// Returns `true` if neither expiration clock is configured.
  #[inline]
  pub(crate) fn is_disabled(&self) -> bool {
    self.time_to_live.is_none() && self.time_to_idle.is_none()
  }

  /// Returns `true` if reads must refresh the idle clock.
  #[inline]
  pub(crate) fn tracks_idle(&self) -> bool {
    self.time_to_idle.is_some()
  }
}
