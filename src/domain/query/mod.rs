//! Query domain - execution of queries against the external data source

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::cache::Row;

/// Executes a query against the external graph-data service
#[async_trait]
pub trait QueryExecutor: Send + Sync + Debug {
    /// Runs `query_text` and returns its rows in result order
    async fn execute(&self, query_text: &str) -> Result<Vec<Row>, DomainError>;
}
