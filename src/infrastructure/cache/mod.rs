//! Cache infrastructure - Query cache implementations

mod disk;
mod tiered;

pub use disk::{ClearReport, DiskRead, DiskTier};
pub use tiered::{TieredCacheConfig, TieredQueryCache};
