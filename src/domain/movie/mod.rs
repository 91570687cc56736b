//! Movie domain - entities and candidate retrieval

mod entity;
mod pool;

pub use entity::Movie;
pub use pool::CandidatePool;

#[cfg(test)]
pub use pool::MockCandidatePool;
