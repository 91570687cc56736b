//! Cache domain - content-addressed query result caching

mod entry;
mod key;
mod repository;

pub use entry::{CacheEntry, Row};
pub use key::{CacheKey, CacheKeyGenerator, Sha256KeyGenerator};
pub use repository::QueryCache;

#[cfg(test)]
pub use repository::mock::MockQueryCache;
