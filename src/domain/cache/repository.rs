//! Query result cache trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use super::{CacheEntry, CacheKey, Row};

/// Cache for external query result sets
///
/// Operations are infallible by signature: storage failures are recovered
/// inside the implementation (logged, then treated as a miss or a no-op) so
/// callers can always fall back to executing the query.
#[async_trait]
pub trait QueryCache: Send + Sync + Debug {
    /// Returns the live entry for `key`, if any
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores a complete, successful result set, replacing any prior entry
    async fn store(&self, key: &CacheKey, rows: Vec<Row>);

    /// Removes every entry, best-effort
    async fn clear(&self);

    /// Bytes used by persisted entries, best-effort
    async fn size_report(&self) -> u64;
}
