//! Two-tier query cache: moka in front of a directory of JSON files

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::policy::EvictionPolicy;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::disk::{DiskRead, DiskTier};
use crate::domain::cache::{CacheEntry, CacheKey, QueryCache, Row};
use crate::infrastructure::metrics::{self, LookupOutcome};

/// Configuration for the tiered cache
#[derive(Debug, Clone, PartialEq)]
pub struct TieredCacheConfig {
    /// Directory holding persisted entries
    pub dir: PathBuf,
    /// Age past which an entry is stale
    pub ttl: Duration,
    /// Maximum number of entries in the memory tier
    pub max_capacity: u64,
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sparql-cache"),
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 1_000,
        }
    }
}

impl TieredCacheConfig {
    /// Creates a configuration rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Sets the time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the memory tier capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Number of per-key locks serializing memory and disk updates
const KEY_LOCK_STRIPES: usize = 64;

/// Query cache with an LRU memory tier backed by persistent files
///
/// Features:
/// - Lazy TTL expiry on both tiers, based on the entry creation time
/// - LRU eviction in memory once capacity is reached
/// - Atomic file replacement on store
/// - Disk failures are logged and degrade to a miss
///
/// Every write to the memory tier happens under a striped per-key lock
/// together with the matching disk operation, and under the shared side of
/// `clear_lock`. `clear` takes the exclusive side, so no entry can be
/// repopulated into memory once a clear has started.
#[derive(Debug)]
pub struct TieredQueryCache {
    memory: MokaCache<CacheKey, CacheEntry>,
    disk: DiskTier,
    ttl: Duration,
    key_locks: Vec<Mutex<()>>,
    clear_lock: RwLock<()>,
}

impl TieredQueryCache {
    /// Opens the cache, creating the directory if it does not exist
    ///
    /// A directory that cannot be created is logged; the cache then runs
    /// from memory and every disk operation degrades to a miss.
    pub async fn open(config: TieredCacheConfig) -> Self {
        let disk = DiskTier::new(&config.dir);

        if let Err(e) = disk.ensure_dir().await {
            warn!("{}", e);
            metrics::record_cache_io_error("create_dir");
        }

        let memory = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        info!(
            dir = %config.dir.display(),
            ttl_secs = config.ttl.as_secs(),
            max_capacity = config.max_capacity,
            "Query cache opened"
        );

        Self {
            memory,
            disk,
            ttl: config.ttl,
            key_locks: (0..KEY_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            clear_lock: RwLock::new(()),
        }
    }

    /// Number of entries persisted on disk
    pub async fn persisted_entry_count(&self) -> usize {
        self.disk.entry_count().await
    }

    #[cfg(test)]
    async fn memory_entry_count(&self) -> u64 {
        self.memory.run_pending_tasks().await;
        self.memory.entry_count()
    }

    fn key_lock(&self, key: &CacheKey) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.key_locks[(hasher.finish() % KEY_LOCK_STRIPES as u64) as usize]
    }

    async fn lookup_disk(&self, key: &CacheKey) -> Option<CacheEntry> {
        let _clear_guard = self.clear_lock.read().await;
        let _key_guard = self.key_lock(key).lock().await;

        // a concurrent store may have landed while waiting for the lock
        if let Some(entry) = self.memory.get(key).await {
            if !entry.is_expired(self.ttl) {
                return Some(entry);
            }
        }

        match self.disk.read(key).await {
            Ok(DiskRead::Found(entry)) => {
                if entry.is_expired(self.ttl) {
                    debug!(key = %key, "Persisted cache entry expired");
                    self.memory.invalidate(key).await;
                    self.remove_from_disk(key).await;
                    return None;
                }

                self.memory.insert(key.clone(), entry.clone()).await;
                Some(entry)
            }
            Ok(DiskRead::Corrupt(reason)) => {
                warn!(key = %key, "Discarding corrupt cache file: {}", reason);
                metrics::record_cache_io_error("decode");
                self.remove_from_disk(key).await;
                None
            }
            Ok(DiskRead::Missing) => None,
            Err(e) => {
                warn!(key = %key, "{}", e);
                metrics::record_cache_io_error("read");
                None
            }
        }
    }

    async fn remove_from_disk(&self, key: &CacheKey) {
        if let Err(e) = self.disk.remove(key).await {
            warn!(key = %key, "{}", e);
            metrics::record_cache_io_error("remove");
        }
    }
}

#[async_trait]
impl QueryCache for TieredQueryCache {
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        if let Some(entry) = self.memory.get(key).await {
            if !entry.is_expired(self.ttl) {
                debug!(key = %key, "Query cache hit (memory)");
                metrics::record_cache_lookup(LookupOutcome::MemoryHit);
                return Some(entry);
            }
        }

        match self.lookup_disk(key).await {
            Some(entry) => {
                debug!(key = %key, "Query cache hit (disk)");
                metrics::record_cache_lookup(LookupOutcome::DiskHit);
                Some(entry)
            }
            None => {
                debug!(key = %key, "Query cache miss");
                metrics::record_cache_lookup(LookupOutcome::Miss);
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, rows: Vec<Row>) {
        let entry = CacheEntry::new(rows);

        let _clear_guard = self.clear_lock.read().await;
        let _key_guard = self.key_lock(key).lock().await;

        if let Err(e) = self.disk.write(key, entry.rows()).await {
            warn!(key = %key, "{}", e);
            metrics::record_cache_io_error("write");
        }

        self.memory.insert(key.clone(), entry.clone()).await;

        debug!(key = %key, rows = entry.len(), "Query result cached");
    }

    async fn clear(&self) {
        let _clear_guard = self.clear_lock.write().await;

        self.memory.invalidate_all();
        self.memory.run_pending_tasks().await;

        let report = self.disk.clear().await;

        if report.failed > 0 {
            metrics::record_cache_io_error("clear");
        }

        info!(
            removed = report.removed,
            failed = report.failed,
            "Query cache cleared"
        );
    }

    async fn size_report(&self) -> u64 {
        self.disk.size_bytes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn rows(titles: &[&str]) -> Vec<Row> {
        titles
            .iter()
            .map(|t| {
                Row::from([
                    ("movie".to_string(), format!("http://dbpedia.org/resource/{}", t)),
                    ("title".to_string(), t.to_string()),
                ])
            })
            .collect()
    }

    async fn open(dir: &TempDir) -> TieredQueryCache {
        TieredQueryCache::open(TieredCacheConfig::new(dir.path())).await
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;
        let key = CacheKey::digest("SELECT * WHERE { ?s ?p ?o }");

        cache.store(&key, rows(&["Dune", "Avatar"])).await;

        let entry = cache.lookup(&key).await.unwrap();
        assert_eq!(entry.rows(), rows(&["Dune", "Avatar"]).as_slice());
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;

        assert!(cache.lookup(&CacheKey::digest("SELECT * FROM xyz")).await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;
        let key = CacheKey::digest("query");

        cache.store(&key, rows(&["A", "B"])).await;
        cache.store(&key, rows(&["C"])).await;

        assert_eq!(cache.lookup(&key).await.unwrap().rows(), rows(&["C"]).as_slice());

        // the persisted copy is replaced as well
        let reopened = open(&dir).await;
        assert_eq!(reopened.lookup(&key).await.unwrap().rows(), rows(&["C"]).as_slice());
    }

    #[tokio::test]
    async fn test_entries_survive_restart() {
        let dir = TempDir::new().unwrap();
        let key = CacheKey::digest("query");

        {
            let cache = open(&dir).await;
            cache.store(&key, rows(&["Dune"])).await;
        }

        let cache = open(&dir).await;
        assert_eq!(cache.memory_entry_count().await, 0);

        let entry = cache.lookup(&key).await.unwrap();
        assert_eq!(entry.rows(), rows(&["Dune"]).as_slice());

        // repopulated into memory
        assert_eq!(cache.memory_entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;
        let first = CacheKey::digest("first");
        let second = CacheKey::digest("second");

        cache.store(&first, rows(&["A"])).await;
        cache.store(&second, rows(&["B"])).await;
        assert!(cache.lookup(&first).await.is_some());

        cache.clear().await;

        assert!(cache.lookup(&first).await.is_none());
        assert!(cache.lookup(&second).await.is_none());
        assert_eq!(cache.size_report().await, 0);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let dir = TempDir::new().unwrap();
        let config = TieredCacheConfig::new(dir.path()).with_ttl(Duration::from_millis(50));
        let cache = TieredQueryCache::open(config).await;
        let key = CacheKey::digest("query");

        cache.store(&key, rows(&["Dune"])).await;
        assert!(cache.lookup(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.lookup(&key).await.is_none());
        // stale file removed on the way
        assert!(!cache.disk.entry_path(&key).exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss_and_removed() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;
        let key = CacheKey::digest("query");

        std::fs::write(cache.disk.entry_path(&key), b"{ not json").unwrap();

        assert!(cache.lookup(&key).await.is_none());
        assert!(!cache.disk.entry_path(&key).exists());
    }

    #[tokio::test]
    async fn test_size_report() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir).await;

        assert_eq!(cache.size_report().await, 0);

        cache.store(&CacheKey::digest("a"), rows(&["A"])).await;
        cache.store(&CacheKey::digest("b"), rows(&["B", "C"])).await;

        let expected: u64 = [rows(&["A"]), rows(&["B", "C"])]
            .iter()
            .map(|r| serde_json::to_vec(r).unwrap().len() as u64)
            .sum();
        assert_eq!(cache.size_report().await, expected);
    }

    #[tokio::test]
    async fn test_memory_capacity_eviction() {
        let dir = TempDir::new().unwrap();
        let config = TieredCacheConfig::new(dir.path()).with_max_capacity(2);
        let cache = TieredQueryCache::open(config).await;

        for i in 0..5 {
            cache
                .store(&CacheKey::digest(&format!("q{}", i)), rows(&["X"]))
                .await;
        }

        assert!(cache.memory_entry_count().await <= 2);

        // evicted entries are still served from disk
        for i in 0..5 {
            assert!(cache.lookup(&CacheKey::digest(&format!("q{}", i))).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_unwritable_directory_degrades_to_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();

        let cache = TieredQueryCache::open(TieredCacheConfig::new(blocker.join("cache"))).await;
        let key = CacheKey::digest("query");

        cache.store(&key, rows(&["Dune"])).await;

        assert!(cache.lookup(&key).await.is_some());
        assert_eq!(cache.size_report().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_store_and_lookup() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(open(&dir).await);
        let key = CacheKey::digest("shared");

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        cache.store(&key, rows(&["A", "B", "C"])).await;
                    } else if let Some(entry) = cache.lookup(&key).await {
                        assert_eq!(entry.len(), 3);
                    }
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        assert_eq!(cache.lookup(&key).await.unwrap().len(), 3);
        assert_eq!(cache.disk.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_clear_racing_lookups_ends_empty() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(open(&dir).await);

        for i in 0..8 {
            cache.store(&CacheKey::digest(&format!("q{}", i)), rows(&["X"])).await;
        }

        let clearer = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.clear().await })
        };
        let readers: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    if let Some(entry) = cache.lookup(&CacheKey::digest(&format!("q{}", i))).await {
                        assert_eq!(entry.len(), 1);
                    }
                })
            })
            .collect();

        clearer.await.unwrap();
        for result in futures::future::join_all(readers).await {
            result.unwrap();
        }

        for i in 0..8 {
            assert!(cache.lookup(&CacheKey::digest(&format!("q{}", i))).await.is_none());
        }
        assert_eq!(cache.size_report().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lookup_racing_clear_leaves_cache_empty() {
        for _ in 0..50 {
            let dir = TempDir::new().unwrap();
            let key = CacheKey::digest("query");
            open(&dir).await.store(&key, rows(&["Dune"])).await;

            // fresh memory tier, so the lookup has to go through the disk tier
            let cache = Arc::new(open(&dir).await);

            let lookup = {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.lookup(&key).await })
            };
            let clear = {
                let cache = cache.clone();
                tokio::spawn(async move { cache.clear().await })
            };
            lookup.await.unwrap();
            clear.await.unwrap();

            assert!(cache.lookup(&key).await.is_none());
            assert_eq!(cache.persisted_entry_count().await, 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_store_racing_clear_keeps_tiers_consistent() {
        for _ in 0..50 {
            let dir = TempDir::new().unwrap();
            let cache = Arc::new(open(&dir).await);
            let key = CacheKey::digest("query");

            let store = {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.store(&key, rows(&["Dune"])).await })
            };
            let clear = {
                let cache = cache.clone();
                tokio::spawn(async move { cache.clear().await })
            };
            store.await.unwrap();
            clear.await.unwrap();

            let from_memory = cache.lookup(&key).await.map(|e| e.to_rows());
            let from_disk = open(&dir).await.lookup(&key).await.map(|e| e.to_rows());
            assert_eq!(from_memory, from_disk);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_leave_tiers_in_agreement() {
        for _ in 0..50 {
            let dir = TempDir::new().unwrap();
            let cache = Arc::new(open(&dir).await);
            let key = CacheKey::digest("query");

            let stores: Vec<_> = [rows(&["A"]), rows(&["B", "C"])]
                .into_iter()
                .map(|r| {
                    let cache = cache.clone();
                    let key = key.clone();
                    tokio::spawn(async move { cache.store(&key, r).await })
                })
                .collect();
            for result in futures::future::join_all(stores).await {
                result.unwrap();
            }

            let from_memory = cache.lookup(&key).await.unwrap().to_rows();
            let from_disk = open(&dir).await.lookup(&key).await.unwrap().to_rows();
            assert_eq!(from_memory, from_disk);
        }
    }
}
