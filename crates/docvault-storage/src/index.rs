//! In-memory metadata cache mirrored to a durable index.
//!
//! Every mutation rewrites the whole index through an [`IndexBackend`].
//! Flushes are serialized and always persist the newest view of the
//! cache, so concurrent writers to different documents cannot roll the
//! index back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::document::DocumentRecord;

use crate::atomic::AtomicWriter;

/// Map of document id to record, ordered by id.
pub type RecordMap = BTreeMap<String, DocumentRecord>;

/// Durable mirror of the metadata cache.
#[async_trait]
pub trait IndexBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g. "json").
    fn backend_type(&self) -> &str;

    /// Read every persisted record. An absent index yields an empty map.
    async fn load(&self) -> AppResult<RecordMap>;

    /// Replace the persisted index with `records`.
    async fn save(&self, records: &RecordMap) -> AppResult<()>;
}

/// Index stored as a single JSON object `{ id: record }`.
#[derive(Debug, Clone)]
pub struct JsonIndexBackend {
    /// Path of the index file.
    path: PathBuf,
    /// Writer used to replace the file.
    writer: AtomicWriter,
}

impl JsonIndexBackend {
    /// Create a backend persisting to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: AtomicWriter::new(),
        }
    }

    /// The index file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move an unparseable index aside so the next flush cannot erase it.
    async fn quarantine(&self) {
        let mut target = self.path.as_os_str().to_os_string();
        target.push(format!(".corrupt.{}", Utc::now().timestamp_millis()));
        let target = PathBuf::from(target);
        match fs::rename(&self.path, &target).await {
            Ok(()) => warn!(path = %target.display(), "Moved malformed index aside"),
            Err(e) => warn!(error = %e, "Failed to move malformed index aside"),
        }
    }
}

#[async_trait]
impl IndexBackend for JsonIndexBackend {
    fn backend_type(&self) -> &str {
        "json"
    }

    async fn load(&self) -> AppResult<RecordMap> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Index,
                    format!("Failed to read index: {}", self.path.display()),
                    e,
                ));
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                self.quarantine().await;
                Err(AppError::with_source(
                    ErrorKind::Index,
                    format!("Malformed index: {}", self.path.display()),
                    e,
                ))
            }
        }
    }

    async fn save(&self, records: &RecordMap) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(records)?;
        self.writer.write(&self.path, &json).await?;
        debug!(path = %self.path.display(), records = records.len(), "Flushed index");
        Ok(())
    }
}

/// The metadata cache: one record per live document id.
#[derive(Debug)]
pub struct MetadataIndex {
    /// Live records keyed by id.
    records: RwLock<RecordMap>,
    /// Serializes flushes against each other.
    flush_lock: Mutex<()>,
    /// Durable mirror.
    backend: Arc<dyn IndexBackend>,
}

impl MetadataIndex {
    /// Create an empty cache over `backend`. Call [`load`](Self::load) to
    /// populate it.
    pub fn new(backend: Arc<dyn IndexBackend>) -> Self {
        Self {
            records: RwLock::new(RecordMap::new()),
            flush_lock: Mutex::new(()),
            backend,
        }
    }

    /// Replace the cache with the persisted index.
    ///
    /// A missing or unreadable index is treated as an empty store.
    /// Returns the number of records loaded.
    pub async fn load(&self) -> usize {
        let loaded = match self.backend.load().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    backend = self.backend.backend_type(),
                    error = %e,
                    "Index unreadable, starting with an empty store"
                );
                RecordMap::new()
            }
        };

        let count = loaded.len();
        *self.records.write().await = loaded;
        info!(backend = self.backend.backend_type(), count, "Metadata index loaded");
        count
    }

    /// Persist the current cache contents.
    pub async fn flush(&self) -> AppResult<()> {
        let _flushing = self.flush_lock.lock().await;
        let snapshot = self.records.read().await.clone();
        self.backend.save(&snapshot).await
    }

    /// Look up a record by id.
    pub async fn get(&self, id: &str) -> Option<DocumentRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Whether `id` is live.
    pub async fn contains(&self, id: &str) -> bool {
        self.records.read().await.contains_key(id)
    }

    /// Look up the record whose content lives at `path`.
    pub async fn find_by_path(&self, path: &Path) -> Option<DocumentRecord> {
        self.records
            .read()
            .await
            .values()
            .find(|record| record.path == path)
            .cloned()
    }

    /// Insert or replace a record, returning the previous one.
    pub async fn put(&self, record: DocumentRecord) -> Option<DocumentRecord> {
        self.records.write().await.insert(record.id.clone(), record)
    }

    /// Insert `record` only if its id is not live. Returns whether it was
    /// inserted.
    pub async fn insert_new(&self, record: DocumentRecord) -> bool {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return false;
        }
        records.insert(record.id.clone(), record);
        true
    }

    /// Remove a record, returning it.
    pub async fn remove(&self, id: &str) -> Option<DocumentRecord> {
        self.records.write().await.remove(id)
    }

    /// Every live record, ordered by id.
    pub async fn list_all(&self) -> Vec<DocumentRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
