//! Vector similarity strategies

use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::FeatureVector;
use crate::domain::DomainError;

/// Similarity score between two feature vectors
///
/// Implementations are pure: the same pair always yields the same score,
/// `compute(a, b) == compute(b, a)`, and the result lies in `[0, 1]` for
/// non-negative weights.
pub trait VectorSimilarity: Send + Sync + Debug {
    fn compute(&self, a: &FeatureVector, b: &FeatureVector) -> f64;

    fn name(&self) -> &'static str;
}

/// Weights of both vectors over the union of their labels, in label order
fn paired_weights<'a>(
    a: &'a FeatureVector,
    b: &'a FeatureVector,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    let labels: BTreeSet<&str> = a.iter().chain(b.iter()).map(|(label, _)| label).collect();
    labels
        .into_iter()
        .map(move |label| (a.weight(label), b.weight(label)))
}

/// Largest weight in the vector, 0 for an empty or all-zero vector
fn max_weight(v: &FeatureVector) -> f64 {
    v.iter().map(|(_, weight)| weight).fold(0.0, f64::max)
}

/// Clamps a ratio into `[0, 1]`, mapping NaN to 0
fn bounded(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Cosine similarity between two sparse vectors
///
/// Each vector is scaled by its largest weight before summing, so very
/// large or very small weights neither overflow nor underflow the norms.
/// Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let (scale_a, scale_b) = (max_weight(a), max_weight(b));
    if scale_a == 0.0 || scale_b == 0.0 {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);

    for (x, y) in paired_weights(a, b) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // sqrt of the product keeps self-similarity at exactly 1.0
    bounded(dot / (norm_a * norm_b).sqrt())
}

/// Weighted Jaccard similarity: sum of minima over sum of maxima
///
/// Reduces to `|A ∩ B| / |A ∪ B|` for multi-hot vectors. Both vectors share
/// one scale factor, which leaves the ratio unchanged. Returns 0 when the
/// union carries no weight.
pub fn jaccard_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let scale = max_weight(a).max(max_weight(b));
    if scale == 0.0 {
        return 0.0;
    }

    let (mut shared, mut total) = (0.0_f64, 0.0_f64);

    for (x, y) in paired_weights(a, b) {
        let (x, y) = (x / scale, y / scale);
        shared += x.min(y);
        total += x.max(y);
    }

    if total == 0.0 {
        return 0.0;
    }

    bounded(shared / total)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl VectorSimilarity for CosineSimilarity {
    fn compute(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        cosine_similarity(a, b)
    }

    fn name(&self) -> &'static str {
        "cosine"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaccardSimilarity;

impl VectorSimilarity for JaccardSimilarity {
    fn compute(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        jaccard_similarity(a, b)
    }

    fn name(&self) -> &'static str {
        "jaccard"
    }
}

/// Configurable choice of similarity strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityStrategy {
    #[default]
    Cosine,
    Jaccard,
}

impl SimilarityStrategy {
    /// Instantiates the strategy
    pub fn build(self) -> Arc<dyn VectorSimilarity> {
        match self {
            Self::Cosine => Arc::new(CosineSimilarity),
            Self::Jaccard => Arc::new(JaccardSimilarity),
        }
    }
}

impl fmt::Display for SimilarityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Jaccard => write!(f, "jaccard"),
        }
    }
}

impl std::str::FromStr for SimilarityStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "jaccard" => Ok(Self::Jaccard),
            _ => Err(DomainError::configuration(format!(
                "Unknown similarity strategy: {}. Valid strategies: cosine, jaccard",
                s
            ))),
        }
    }
}
