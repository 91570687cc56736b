use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, QueryExecutor, Row};

pub const DEFAULT_SPARQL_ENDPOINT: &str = "https://dbpedia.org/sparql";
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

const SOURCE_NAME: &str = "sparql";

/// Executes SPARQL SELECT queries against an HTTP endpoint
#[derive(Debug, Clone)]
pub struct SparqlHttpExecutor {
    client: reqwest::Client,
    endpoint: String,
}

impl SparqlHttpExecutor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryExecutor for SparqlHttpExecutor {
    async fn execute(&self, query_text: &str) -> Result<Vec<Row>, DomainError> {
        debug!(endpoint = %self.endpoint, "Sending SPARQL query");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query_text)])
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .send()
            .await
            .map_err(|e| DomainError::external_query(SOURCE_NAME, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();

            return Err(DomainError::external_query(
                SOURCE_NAME,
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let body: SparqlResponse = response.json().await.map_err(|e| {
            DomainError::external_query(SOURCE_NAME, format!("Failed to parse response: {}", e))
        })?;

        Ok(body.into_rows())
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

impl SparqlResponse {
    fn into_rows(self) -> Vec<Row> {
        self.results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .map(|(variable, term)| (variable, term.value))
                    .collect()
            })
            .collect()
    }
}
