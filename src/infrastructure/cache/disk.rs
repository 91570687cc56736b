//! On-disk tier: one JSON file per cache entry

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::cache::{CacheEntry, CacheKey, Row};

/// Extension of persisted entry files
const ENTRY_EXTENSION: &str = "json";

/// Extension of in-flight temporary files
const TEMP_EXTENSION: &str = "tmp";

/// Outcome of reading an entry file
#[derive(Debug)]
pub enum DiskRead {
    Missing,
    Found(CacheEntry),
    /// The file exists but does not hold a valid row list
    Corrupt(String),
}

/// Result of a best-effort directory sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
}

/// Directory of `<hex-key>.json` files, each holding a JSON array of rows
///
/// The file's modification time is the entry's creation time. Writes go to
/// a uniquely named temporary file first and are renamed into place, so a
/// reader never observes a partially written entry.
#[derive(Debug, Clone)]
pub struct DiskTier {
    root: PathBuf,
}

impl DiskTier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the cache directory if needed
    pub async fn ensure_dir(&self) -> Result<(), DomainError> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            DomainError::cache(format!(
                "Failed to create cache directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Path of the entry file for `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_hex(), ENTRY_EXTENSION))
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!(
            ".{}.{}.{}",
            key.as_hex(),
            Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ))
    }

    /// Reads and decodes the entry for `key`
    ///
    /// I/O failures are returned as errors; undecodable content is reported
    /// as [`DiskRead::Corrupt`].
    pub async fn read(&self, key: &CacheKey) -> Result<DiskRead, DomainError> {
        let path = self.entry_path(key);

        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DiskRead::Missing),
            Err(e) => return Err(io_error("open", &path, e)),
        };

        let metadata = file.metadata().await.map_err(|e| io_error("stat", &path, e))?;
        let mut data = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut data)
            .await
            .map_err(|e| io_error("read", &path, e))?;

        let rows: Vec<Row> = match serde_json::from_slice(&data) {
            Ok(rows) => rows,
            Err(e) => return Ok(DiskRead::Corrupt(e.to_string())),
        };

        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(DiskRead::Found(CacheEntry::with_created_at(rows, created_at)))
    }

    /// Atomically writes the rows for `key`, replacing any existing file
    pub async fn write(&self, key: &CacheKey, rows: &[Row]) -> Result<(), DomainError> {
        let data = serde_json::to_vec(rows)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cache entry: {}", e)))?;

        let temp_path = self.temp_path(key);
        let result = self.write_then_rename(&temp_path, &self.entry_path(key), &data).await;

        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }

        result
    }

    async fn write_then_rename(
        &self,
        temp_path: &Path,
        final_path: &Path,
        data: &[u8],
    ) -> Result<(), DomainError> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| io_error("create", temp_path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| io_error("write", temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("sync", temp_path, e))?;
        drop(file);

        fs::rename(temp_path, final_path)
            .await
            .map_err(|e| io_error("rename", final_path, e))
    }

    /// Deletes the entry for `key`; returns whether a file was removed
    pub async fn remove(&self, key: &CacheKey) -> Result<bool, DomainError> {
        let path = self.entry_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }

    /// Deletes every entry and temporary file, skipping files that cannot be
    /// removed
    pub async fn clear(&self) -> ClearReport {
        let mut report = ClearReport::default();

        for path in self.list_files(is_cache_file).await {
            match fs::remove_file(&path).await {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove cache file {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Total size in bytes of the persisted entry files
    pub async fn size_bytes(&self) -> u64 {
        let mut total = 0;

        for path in self.list_files(is_entry_file).await {
            if let Ok(metadata) = fs::metadata(&path).await {
                total += metadata.len();
            }
        }

        total
    }

    /// Number of persisted entry files
    pub async fn entry_count(&self) -> usize {
        self.list_files(is_entry_file).await.len()
    }

    async fn list_files(&self, filter: fn(&str) -> bool) -> Vec<PathBuf> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to list cache directory {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut files = Vec::new();

        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let is_file = entry
                        .file_type()
                        .await
                        .map(|t| t.is_file())
                        .unwrap_or(false);

                    if is_file && entry.file_name().to_str().is_some_and(filter) {
                        files.push(entry.path());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read cache directory entry: {}", e);
                    break;
                }
            }
        }

        files
    }
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> DomainError {
    DomainError::cache(format!(
        "Failed to {} cache file {}: {}",
        action,
        path.display(),
        error
    ))
}

/// `<64-hex>.json`
fn is_entry_file(name: &str) -> bool {
    name.strip_suffix(ENTRY_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some_and(CacheKey::is_valid_hex)
}

/// `.<64-hex>.<id>.tmp`
fn is_temp_file(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_EXTENSION))
        .and_then(|rest| rest.split('.').next())
        .is_some_and(CacheKey::is_valid_hex)
}

fn is_cache_file(name: &str) -> bool {
    is_entry_file(name) || is_temp_file(name)
}
