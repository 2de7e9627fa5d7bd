//! Task store abstraction and implementations
//!
//! The rest of the core consumes the [`TaskStore`] trait; the concrete
//! backend is chosen at construction time:
//! - [`SqliteStore`] — SQLite-backed persistent store
//! - [`MemoryStore`] — in-process store for tests and embedding

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Shared key-value store holding task records and the identifier counter
///
/// Guarantees consumed by the core:
/// - `set` has last-writer-wins overwrite semantics
/// - `get_many` results align positionally with the input keys; absent
///   entries are `None`, not errors
/// - `get_by_prefix` order is unspecified and may race with concurrent
///   deletes; callers tolerate missing entries silently
/// - `next_id` is a single atomic increment-and-get starting at 1, so two
///   concurrent allocations can never observe the same value
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Whether a value exists under the key
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// The value stored under the key, if any
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Values for the given keys, positionally aligned with the input
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError>;

    /// All values whose keys start with the prefix, in unspecified order
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Store a value under the key, overwriting any previous value
    ///
    /// A `ttl` of `None` means no expiry.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove the value stored under the key, if any
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically increment the named counter and return the new value
    ///
    /// The first call for a counter returns 1.
    async fn next_id(&self, counter: &str) -> Result<u64, StoreError>;
}
