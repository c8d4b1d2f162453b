//! An embeddable, thread-safe, in-memory cache with bounded capacity and
//! pluggable eviction.
//!
//! # Features
//! - **High Concurrency**: Built with a sharded architecture to minimize lock contention.
//! - **Non-Clone Support**: Stores values in an `Arc<V>`, avoiding `V: Clone` bounds.
//! - **Pluggable Eviction**: LRU, LFU, FIFO, LIFO, and MRU policies out of the box,
//!   plus a trait for user-supplied ones.
//! - **Expiration**: Time-to-Live (TTL) and Time-to-Idle (TTI) clocks with a
//!   background sweeper.
//! - **Single-Flight Loading**: `get_or_compute` collapses concurrent misses for
//!   the same key into one computation.
//! - **Observability**: Hit/miss/load/eviction statistics and synchronous
//!   lifecycle listeners.

// Public modules that form the API
pub mod builder;
pub mod cache;
pub mod error;
pub mod iter;
pub mod listener;
pub mod policy;
pub mod stats;

// Internal, crate-only modules
mod compute;
mod entry;
mod expiry;
mod janitor;
mod shared;
mod table;
mod time;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use cache::Cache;
pub use error::{BuildError, LoadError};
pub use iter::{EntryIter, KeyIter, ValueIter};
pub use listener::{CacheListener, EvictionReason, ListenerFaultHandler, ListenerId};
pub use policy::{EvictionPolicy, PolicyKind};
pub use stats::StatsSnapshot;
