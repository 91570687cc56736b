use std::time::Duration;

use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Disk or memory tier failure. Recovered inside the cache and never
    /// returned from a lookup or store.
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("External query error: {source_name} - {message}")]
    ExternalQuery { source_name: String, message: String },

    #[error("External query timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn external_query(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalQuery {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    /// Whether this error came from the external data source (failure or timeout)
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalQuery { .. } | Self::Timeout { .. })
    }
}
