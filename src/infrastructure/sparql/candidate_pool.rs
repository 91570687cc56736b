use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::{CandidatePool, DomainError, Movie, QueryExecutor, Row};

/// Separator used when subjects are concatenated into a single binding
pub const SUBJECT_SEPARATOR: char = '|';

const DEFAULT_CANDIDATE_LIMIT: usize = 2000;

static LANGUAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z]{2,3}(?:-[A-Za-z0-9]+)*$").unwrap());

/// Strips RDF datatype and language annotations from a literal
///
/// `"1979-05-25"^^http://www.w3.org/2001/XMLSchema#date` becomes
/// `1979-05-25` and `Alien@en` becomes `Alien`.
pub fn clean_literal(value: &str) -> String {
    let without_type = match value.find("^^") {
        Some(idx) => &value[..idx],
        None => value,
    };
    let without_lang = match LANGUAGE_TAG.find(without_type) {
        Some(m) => &without_type[..m.start()],
        None => without_type,
    };

    without_lang.trim().trim_matches('"').trim().to_string()
}

/// Query selecting films released in `[start_year, end_year)` with their
/// English subject labels concatenated into `?subjects`
pub fn build_decade_query(start_year: i32, end_year: i32, limit: usize) -> String {
    format!(
        r#"PREFIX dbo: <http://dbpedia.org/ontology/>
PREFIX dct: <http://purl.org/dc/terms/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
SELECT ?movie (SAMPLE(?label) AS ?title) (SAMPLE(STR(?date)) AS ?year)
       (GROUP_CONCAT(DISTINCT ?subjectLabel; separator="{separator}") AS ?subjects)
WHERE {{
  ?movie a dbo:Film ;
         dbo:releaseDate ?date ;
         rdfs:label ?label ;
         dct:subject ?subject .
  ?subject rdfs:label ?subjectLabel .
  FILTER (lang(?label) = "en" && lang(?subjectLabel) = "en")
  FILTER (YEAR(?date) >= {start_year} && YEAR(?date) < {end_year})
}}
GROUP BY ?movie
LIMIT {limit}"#,
        separator = SUBJECT_SEPARATOR,
    )
}

/// Candidate pool backed by a SPARQL endpoint
///
/// Queries go through the supplied [`QueryExecutor`], normally the cached
/// one, so repeated decades are answered locally.
#[derive(Debug, Clone)]
pub struct SparqlCandidatePool {
    executor: Arc<dyn QueryExecutor>,
    limit: usize,
}

impl SparqlCandidatePool {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    /// Caps the number of candidates requested per decade
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn row_to_movie(row: &Row) -> Option<Movie> {
        let uri = row.get("movie").map(|v| clean_literal(v))?;
        if uri.is_empty() {
            return None;
        }

        let mut movie = Movie::new(uri);

        if let Some(title) = row.get("title").map(|v| clean_literal(v)).filter(|t| !t.is_empty()) {
            movie = movie.with_title(title);
        }
        if let Some(date) = row.get("year").map(|v| clean_literal(v)).filter(|d| !d.is_empty()) {
            movie = movie.with_release_date(date);
        }
        if let Some(subjects) = row.get("subjects") {
            movie = movie.with_subjects(
                subjects
                    .split(SUBJECT_SEPARATOR)
                    .map(clean_literal)
                    .filter(|s| !s.is_empty()),
            );
        }

        Some(movie)
    }
}

#[async_trait]
impl CandidatePool for SparqlCandidatePool {
    async fn fetch_by_decade(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<Movie>, DomainError> {
        let query = build_decade_query(start_year, end_year, self.limit);
        let rows = self.executor.execute(&query).await?;

        let movies: Vec<Movie> = rows.iter().filter_map(Self::row_to_movie).collect();

        debug!(
            start_year,
            end_year,
            rows = rows.len(),
            movies = movies.len(),
            "Fetched decade candidates"
        );

        Ok(movies)
    }
}
