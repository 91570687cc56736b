//! Cached result sets

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// One result row: variable name to its lexical value
pub type Row = BTreeMap<String, String>;

/// A cached, immutable result set
///
/// Rows are shared behind an `Arc` so that memory-tier hits hand out
/// cheap clones instead of copying the whole result set.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    rows: Arc<Vec<Row>>,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time
    pub fn new(rows: Vec<Row>) -> Self {
        Self::with_created_at(rows, Utc::now())
    }

    /// Creates an entry with an explicit creation time (e.g. a file mtime)
    pub fn with_created_at(rows: Vec<Row>, created_at: DateTime<Utc>) -> Self {
        Self {
            rows: Arc::new(rows),
            created_at,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns an owned copy of the rows
    pub fn to_rows(&self) -> Vec<Row> {
        self.rows.as_ref().clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Age relative to `now`, clamped at zero for timestamps in the future
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is older than `ttl` at `now`
    pub fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) > ttl
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.is_expired_at(ttl, Utc::now())
    }
}
