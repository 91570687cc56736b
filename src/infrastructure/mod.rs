//! Infrastructure layer - External service implementations

pub mod cache;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod sparql;
