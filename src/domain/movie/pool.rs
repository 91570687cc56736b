//! Candidate pool trait

use async_trait::async_trait;

use super::Movie;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Source of candidate movies for similarity ranking
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CandidatePool: Send + Sync {
    /// Movies released in `[start_year, end_year)`
    async fn fetch_by_decade(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<Movie>, DomainError>;
}
