//! Infrastructure services

mod query_cache_service;

pub use query_cache_service::{CacheStats, CachedQueryExecutor, DEFAULT_QUERY_TIMEOUT};
