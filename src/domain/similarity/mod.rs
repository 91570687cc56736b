//! Similarity domain - feature vectors, scoring strategies and ranking

mod engine;
mod normalize;
mod strategy;
mod vector;

pub use engine::{rank_candidates, ScoredMovie, SimilarityEngine};
pub use normalize::{decade_label, decade_start, extract_year, normalize_tag, DECADE_LABEL_PREFIX};
pub use strategy::{
    cosine_similarity, jaccard_similarity, CosineSimilarity, JaccardSimilarity,
    SimilarityStrategy, VectorSimilarity,
};
pub use vector::FeatureVector;
