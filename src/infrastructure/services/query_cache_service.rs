//! Cache-aside execution of external queries

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::cache::{CacheKey, CacheKeyGenerator, QueryCache, Row, Sha256KeyGenerator};
use crate::domain::{DomainError, QueryExecutor};
use crate::infrastructure::metrics;

/// Default bound on a single external query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache statistics for administration endpoints
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CacheStats {
    /// Bytes used by persisted entries
    pub size_bytes: u64,
}

impl CacheStats {
    pub fn size_megabytes(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Query executor that consults a [`QueryCache`] before the external service
///
/// The external call runs outside of any cache lock and is bounded by a
/// timeout. Only successful result sets are stored; failures and timeouts
/// are returned to the caller and leave the cache untouched.
pub struct CachedQueryExecutor {
    inner: Arc<dyn QueryExecutor>,
    cache: Arc<dyn QueryCache>,
    key_generator: Arc<dyn CacheKeyGenerator>,
    timeout: Duration,
}

impl fmt::Debug for CachedQueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedQueryExecutor")
            .field("inner", &self.inner)
            .field("key_generator", &self.key_generator)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CachedQueryExecutor {
    /// Creates a cached executor with SHA-256 keys and the default timeout
    pub fn new(inner: Arc<dyn QueryExecutor>, cache: Arc<dyn QueryCache>) -> Self {
        Self {
            inner,
            cache,
            key_generator: Arc::new(Sha256KeyGenerator::new()),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Sets the bound on the external call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the key derivation
    pub fn with_key_generator(mut self, key_generator: Arc<dyn CacheKeyGenerator>) -> Self {
        self.key_generator = key_generator;
        self
    }

    pub fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Key under which results for `query_text` are cached
    pub fn cache_key(&self, query_text: &str) -> CacheKey {
        self.key_generator.generate(query_text)
    }

    /// Empties the cache
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Returns cache statistics
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            size_bytes: self.cache.size_report().await,
        }
    }

    async fn execute_external(&self, query_text: &str) -> Result<Vec<Row>, DomainError> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.inner.execute(query_text)).await;
        let elapsed = started.elapsed();

        match result {
            Ok(Ok(rows)) => {
                metrics::record_external_query(elapsed, true);
                Ok(rows)
            }
            Ok(Err(e)) => {
                metrics::record_external_query(elapsed, false);
                warn!("External query failed after {:?}: {}", elapsed, e);
                Err(e)
            }
            Err(_) => {
                metrics::record_external_query(elapsed, false);
                warn!("External query timed out after {:?}", self.timeout);
                Err(DomainError::timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for CachedQueryExecutor {
    async fn execute(&self, query_text: &str) -> Result<Vec<Row>, DomainError> {
        let key = self.cache_key(query_text);

        if let Some(entry) = self.cache.lookup(&key).await {
            return Ok(entry.to_rows());
        }

        let rows = self.execute_external(query_text).await?;

        debug!(key = %key, rows = rows.len(), "Caching external query result");
        self.cache.store(&key, rows.clone()).await;

        Ok(rows)
    }
}
