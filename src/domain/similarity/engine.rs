//! Content-based similarity ranking

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::normalize::{decade_start, normalize_tag};
use super::{CosineSimilarity, FeatureVector, VectorSimilarity};
use crate::domain::DomainError;
use crate::domain::movie::{CandidatePool, Movie};

/// A candidate together with its similarity to the target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMovie {
    pub movie: Movie,
    pub score: f64,
}

/// Ranks movies from the target's decade by feature similarity
pub struct SimilarityEngine {
    pool: Arc<dyn CandidatePool>,
    similarity: Arc<dyn VectorSimilarity>,
}

impl fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("similarity", &self.similarity.name())
            .finish_non_exhaustive()
    }
}

impl SimilarityEngine {
    /// Creates an engine scoring with cosine similarity
    pub fn new(pool: Arc<dyn CandidatePool>) -> Self {
        Self::with_similarity(pool, Arc::new(CosineSimilarity))
    }

    pub fn with_similarity(
        pool: Arc<dyn CandidatePool>,
        similarity: Arc<dyn VectorSimilarity>,
    ) -> Self {
        Self { pool, similarity }
    }

    pub fn similarity_name(&self) -> &'static str {
        self.similarity.name()
    }

    /// Movies most similar to `target`, best first
    pub async fn get_similar(&self, target: &Movie, limit: usize) -> Result<Vec<Movie>, DomainError> {
        Ok(self
            .rank(target, limit)
            .await?
            .into_iter()
            .map(|scored| scored.movie)
            .collect())
    }

    /// Like [`get_similar`](Self::get_similar) but keeps the scores
    ///
    /// A target without a release year or without usable subjects yields an
    /// empty ranking rather than an error. Candidate pool failures are
    /// propagated.
    pub async fn rank(&self, target: &Movie, limit: usize) -> Result<Vec<ScoredMovie>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let Some(year) = target.release_year() else {
            debug!(uri = target.uri(), "Target has no usable release year, no recommendations");
            return Ok(Vec::new());
        };

        if !target.subjects().iter().any(|s| normalize_tag(s).is_some()) {
            debug!(uri = target.uri(), "Target has no usable subjects, no recommendations");
            return Ok(Vec::new());
        }

        let start = decade_start(year);
        let end = start + 10;
        debug!(uri = target.uri(), start, end, "Fetching candidates by decade");

        let mut candidates = self.pool.fetch_by_decade(start, end).await?;
        let fetched = candidates.len();
        candidates.retain(|candidate| candidate.uri() != target.uri());

        debug!(
            fetched,
            eligible = candidates.len(),
            strategy = self.similarity.name(),
            "Scoring candidates"
        );

        let target_vector = FeatureVector::from_movie(target);
        Ok(rank_candidates(
            &target_vector,
            candidates,
            self.similarity.as_ref(),
            limit,
        ))
    }
}

/// Scores every candidate against `target_vector`, then sorts and truncates
///
/// The sort is stable: equal scores keep the candidates' input order.
pub fn rank_candidates(
    target_vector: &FeatureVector,
    candidates: Vec<Movie>,
    similarity: &dyn VectorSimilarity,
    limit: usize,
) -> Vec<ScoredMovie> {
    let mut scored: Vec<ScoredMovie> = candidates
        .into_iter()
        .map(|movie| {
            let score = similarity.compute(target_vector, &FeatureVector::from_movie(&movie));
            ScoredMovie { movie, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
