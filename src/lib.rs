//! Movie Explorer
//!
//! Core services for exploring films from a public knowledge graph:
//! - Persistent two-tier cache for SPARQL query results
//! - Content-based similarity ranking over subjects and release decade
//! - SPARQL endpoint adapters and a command-line front end

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::{DomainError, SimilarityEngine};
use infrastructure::cache::TieredQueryCache;
use infrastructure::services::CachedQueryExecutor;
use infrastructure::sparql::{SparqlCandidatePool, SparqlHttpExecutor};

/// Fully wired services
#[derive(Debug, Clone)]
pub struct AppServices {
    pub executor: Arc<CachedQueryExecutor>,
    pub engine: Arc<SimilarityEngine>,
}

/// Build the cache, the SPARQL executor and the similarity engine from configuration
pub async fn create_services(config: &AppConfig) -> Result<AppServices, DomainError> {
    let cache = TieredQueryCache::open(config.cache.to_tiered()).await;
    info!(
        dir = %config.cache.dir.display(),
        ttl_secs = config.cache.ttl_secs,
        "Query cache ready"
    );

    let sparql = SparqlHttpExecutor::new(&config.sparql.endpoint, config.sparql.timeout())?;
    info!(endpoint = %sparql.endpoint(), "Using SPARQL endpoint");

    let executor = Arc::new(
        CachedQueryExecutor::new(Arc::new(sparql), Arc::new(cache))
            .with_timeout(config.sparql.timeout()),
    );

    let pool = SparqlCandidatePool::new(executor.clone());
    let engine = SimilarityEngine::with_similarity(
        Arc::new(pool),
        config.similarity.strategy.build(),
    );
    info!(strategy = %config.similarity.strategy, "Similarity engine ready");

    Ok(AppServices {
        executor,
        engine: Arc::new(engine),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_services_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.dir = dir.path().join("cache");
        config.similarity.strategy = domain::SimilarityStrategy::Jaccard;

        let services = create_services(&config).await.unwrap();

        assert_eq!(services.engine.similarity_name(), "jaccard");
        assert_eq!(services.executor.timeout(), config.sparql.timeout());
        assert_eq!(services.executor.stats().await.size_bytes, 0);
    }
}
