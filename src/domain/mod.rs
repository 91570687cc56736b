//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod movie;
pub mod query;
pub mod similarity;

pub use cache::{CacheEntry, CacheKey, CacheKeyGenerator, QueryCache, Row, Sha256KeyGenerator};
pub use error::DomainError;
pub use movie::{CandidatePool, Movie};
pub use query::QueryExecutor;
pub use similarity::{
    FeatureVector, ScoredMovie, SimilarityEngine, SimilarityStrategy, VectorSimilarity,
};
