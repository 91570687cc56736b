//! SPARQL endpoint adapters

mod candidate_pool;
mod client;

pub use candidate_pool::{build_decade_query, clean_literal, SparqlCandidatePool, SUBJECT_SEPARATOR};
pub use client::{SparqlHttpExecutor, DEFAULT_SPARQL_ENDPOINT, SPARQL_RESULTS_JSON};
