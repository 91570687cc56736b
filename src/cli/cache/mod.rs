//! Cache administration commands

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::infrastructure::cache::TieredQueryCache;
use crate::domain::QueryCache;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Report the size of the persisted cache
    Info,
    /// Remove every cached result
    Clear,
}

#[derive(Debug, Serialize)]
struct CacheInfo {
    dir: String,
    entries: usize,
    size_bytes: u64,
    size_mb: f64,
}

pub async fn run(args: CacheArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let cache = TieredQueryCache::open(config.cache.to_tiered()).await;

    match args.action {
        CacheAction::Info => {
            let size_bytes = cache.size_report().await;
            super::print_json(&CacheInfo {
                dir: config.cache.dir.display().to_string(),
                entries: cache.persisted_entry_count().await,
                size_bytes,
                size_mb: size_bytes as f64 / (1024.0 * 1024.0),
            })
        }
        CacheAction::Clear => {
            cache.clear().await;
            info!(dir = %config.cache.dir.display(), "Cache cleared");
            super::print_json(&serde_json::json!({ "status": "cleared" }))
        }
    }
}
