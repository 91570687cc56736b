//! Sparse feature vectors

use std::collections::BTreeMap;

use crate::domain::DomainError;
use crate::domain::movie::Movie;

use super::normalize::{decade_label, normalize_tag};

/// Sparse mapping from feature label to non-negative weight
///
/// Keys are kept sorted so that every traversal, and therefore every
/// floating-point sum over the vector, happens in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    weights: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-hot vector: weight 1 for each distinct label
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            weights: labels.into_iter().map(|l| (l.into(), 1.0)).collect(),
        }
    }

    /// Builds the feature vector of a movie
    ///
    /// One weight-1 entry per normalized subject, plus the decade bucket
    /// when the release date carries a year. This is the only place movies
    /// are vectorized, so targets and candidates always agree on labels.
    pub fn from_movie(movie: &Movie) -> Self {
        let mut labels: Vec<String> = movie
            .subjects()
            .iter()
            .filter_map(|subject| normalize_tag(subject))
            .collect();

        if let Some(year) = movie.release_year() {
            labels.push(decade_label(year));
        }

        Self::from_labels(labels)
    }

    /// Sets the weight of a label; weights must be finite and non-negative
    pub fn insert(&mut self, label: impl Into<String>, weight: f64) -> Result<(), DomainError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DomainError::validation(format!(
                "Feature weight must be finite and non-negative, got {}",
                weight
            )));
        }

        self.weights.insert(label.into(), weight);
        Ok(())
    }

    pub fn with(mut self, label: impl Into<String>, weight: f64) -> Result<Self, DomainError> {
        self.insert(label, weight)?;
        Ok(self)
    }

    /// Weight of `label`, zero when absent
    pub fn weight(&self, label: &str) -> f64 {
        self.weights.get(label).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.weights.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Entries in ascending label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(label, weight)| (label.as_str(), *weight))
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_movie() {
        let movie = Movie::new("urn:movie:avatar")
            .with_release_date("2025")
            .with_subjects(["Science fiction films", "Action films"]);

        let vector = FeatureVector::from_movie(&movie);

        assert_eq!(vector.len(), 3);
        assert_eq!(vector.weight("science fiction"), 1.0);
        assert_eq!(vector.weight("action"), 1.0);
        assert_eq!(vector.weight("decade_2020"), 1.0);
    }

    #[test]
    fn test_from_movie_deduplicates_labels() {
        let movie = Movie::new("urn:movie:1").with_subjects(["Action films", "action", "ACTION FILM"]);

        let vector = FeatureVector::from_movie(&movie);

        assert_eq!(vector.len(), 1);
        assert_eq!(vector.weight("action"), 1.0);
    }

    #[test]
    fn test_from_movie_without_year_or_tags() {
        let movie = Movie::new("urn:movie:1").with_release_date("n/a");
        assert!(FeatureVector::from_movie(&movie).is_empty());
    }

    #[test]
    fn test_insert_rejects_invalid_weights() {
        let mut vector = FeatureVector::new();

        assert!(vector.insert("a", -1.0).is_err());
        assert!(vector.insert("a", f64::NAN).is_err());
        assert!(vector.insert("a", f64::INFINITY).is_err());
        assert!(vector.insert("a", 0.0).is_ok());
        assert!(vector.contains("a"));
    }

    #[test]
    fn test_norm_and_missing_weight() {
        let vector = FeatureVector::new()
            .with("x", 3.0)
            .unwrap()
            .with("y", 4.0)
            .unwrap();

        assert_eq!(vector.norm(), 5.0);
        assert_eq!(vector.weight("z"), 0.0);
    }

    #[test]
    fn test_iter_sorted() {
        let vector = FeatureVector::from_labels(["zeta", "alpha", "mid"]);
        let labels: Vec<&str> = vector.iter().map(|(l, _)| l).collect();

        assert_eq!(labels, vec!["alpha", "mid", "zeta"]);
    }
}
