//! Document store facade.
//!
//! Each mutating operation holds the write lock of the document's path for
//! its whole duration, so snapshot, content write, cache update and index
//! flush happen as one step relative to other operations on that document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};
use uuid::Uuid;

use docvault_core::config::StorageConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::Page;
use docvault_entity::document::{
    DEFAULT_CATEGORY, DocumentRecord, StorageStats, StoreRequest, VersionSnapshot,
};

use crate::archive::{RetentionPolicy, VersionArchive, retention_from_config};
use crate::atomic::AtomicWriter;
use crate::hash::content_hash;
use crate::index::{IndexBackend, JsonIndexBackend, MetadataIndex};
use crate::lock::{LockKind, LockTable};
use crate::query::{self, ListOptions};

/// Longest file-name stem kept from a document name.
const MAX_STEM_LEN: usize = 64;

/// Content and metadata returned by a read.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Raw document bytes.
    pub content: Bytes,
    /// Metadata, cached or regenerated from the file.
    pub metadata: DocumentRecord,
}

/// The document store.
///
/// Owns every piece of mutable engine state; clones share it.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: StorageConfig,
    locks: LockTable,
    writer: AtomicWriter,
    index: MetadataIndex,
    archive: VersionArchive,
    admission: Option<Semaphore>,
}

impl DocumentStore {
    /// Create a store with the JSON index and the configured retention.
    pub fn new(config: StorageConfig) -> AppResult<Self> {
        let backend = Arc::new(JsonIndexBackend::new(config.index_file()));
        let retention = retention_from_config(&config.retention);
        Self::with_parts(config, backend, retention)
    }

    /// Create a store over a custom index backend and retention policy.
    pub fn with_parts(
        config: StorageConfig,
        backend: Arc<dyn IndexBackend>,
        retention: Arc<dyn RetentionPolicy>,
    ) -> AppResult<Self> {
        config.validate()?;

        let admission =
            (config.max_concurrent_ops > 0).then(|| Semaphore::new(config.max_concurrent_ops));

        let inner = Inner {
            locks: LockTable::new(config.locking_enabled),
            writer: AtomicWriter::new(),
            index: MetadataIndex::new(backend),
            archive: VersionArchive::new(config.versions_path(), retention),
            admission,
            config,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// The lock table, for diagnostics.
    pub fn locks(&self) -> &LockTable {
        &self.inner.locks
    }

    /// Create the directory layout, discard orphaned temp files, and load
    /// the metadata index.
    pub async fn initialize(&self) -> AppResult<()> {
        let config = &self.inner.config;
        let dirs = [
            config.documents_path(),
            config.metadata_path(),
            config.versions_path(),
        ];
        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory: {}", dir.display()),
                    e,
                )
            })?;
        }

        let mut swept = 0;
        for dir in &dirs {
            swept += self.inner.writer.sweep_orphans(dir).await?;
        }
        if swept > 0 {
            warn!(swept, "Removed temp files left by an interrupted write");
        }

        let loaded = self.inner.index.load().await;
        info!(
            base_dir = %config.base_dir.display(),
            documents = loaded,
            locking = config.locking_enabled,
            "Document store initialized"
        );
        Ok(())
    }

    /// Store a new document.
    pub async fn store(
        &self,
        name: &str,
        content: &[u8],
        request: StoreRequest,
    ) -> AppResult<DocumentRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Document name must not be empty"));
        }
        if let Some(id) = &request.id {
            validate_id(id)?;
            if self.inner.index.contains(id).await {
                return Err(AppError::conflict(format!("Document {id} already exists")));
            }
        }

        let _permit = self.admit().await?;
        let path = self
            .inner
            .config
            .documents_path()
            .join(unique_file_name(name));
        let _guard = self.inner.locks.acquire(&path, LockKind::Write).await?;

        let outcome = self.inner.writer.write(&path, content).await?;
        let now = Utc::now();
        let explicit_id = request.id.is_some();
        let record = DocumentRecord {
            id: request.id.unwrap_or_else(|| outcome.hash.clone()),
            name: name.to_string(),
            path: path.clone(),
            size: outcome.size,
            created_at: now,
            modified_at: now,
            content_hash: outcome.hash,
            version: 1,
            tags: request.tags,
            category: request
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            author: request.author,
        };

        let record = match self.claim_id(record, explicit_id).await {
            Ok(record) => record,
            Err(e) => {
                discard_file(&path).await;
                return Err(e);
            }
        };

        if let Err(e) = self.inner.index.flush().await {
            self.inner.index.remove(&record.id).await;
            discard_file(&path).await;
            return Err(e);
        }

        info!(id = %record.id, name = %record.name, bytes = record.size, "Document stored");
        Ok(record)
    }

    /// Insert `record` under its id, or under a suffixed id when a derived
    /// id is already taken.
    async fn claim_id(
        &self,
        mut record: DocumentRecord,
        explicit: bool,
    ) -> AppResult<DocumentRecord> {
        loop {
            if self.inner.index.insert_new(record.clone()).await {
                return Ok(record);
            }
            if explicit {
                return Err(AppError::conflict(format!(
                    "Document {} already exists",
                    record.id
                )));
            }
            let suffix = Uuid::new_v4().simple().to_string();
            record.id = format!("{}-{}", record.content_hash, &suffix[..8]);
            debug!(id = %record.id, "Derived id taken, using suffixed id");
        }
    }

    /// Read the content at `path` together with its metadata.
    ///
    /// `path` must name a file directly inside the documents directory. It is
    /// resolved to the form stored in records, so every spelling of a path
    /// shares one lock and one cache entry.
    pub async fn read(&self, path: &Path) -> AppResult<StoredDocument> {
        let resolved = self.resolve_document_path(path).await?;
        let path = resolved.as_path();

        let _permit = self.admit().await?;
        let _guard = self.inner.locks.acquire(path, LockKind::Read).await?;

        let content = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Document not found: {}", path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read document: {}", path.display()),
                    e,
                )
            }
        })?;

        let metadata = match self.inner.index.find_by_path(path).await {
            Some(record) => record,
            None => {
                debug!(path = %path.display(), "No cached metadata, regenerating from file");
                metadata_from_file(path, &content).await?
            }
        };

        Ok(StoredDocument {
            content: Bytes::from(content),
            metadata,
        })
    }

    /// Read a live document by id.
    pub async fn read_document(&self, id: &str) -> AppResult<StoredDocument> {
        let record = self.get(id).await?;
        let document = self.read(&record.path).await?;
        if document.metadata.id != id {
            return Err(AppError::not_found(format!("Document {id} not found")));
        }
        Ok(document)
    }

    /// Metadata of a live document.
    pub async fn get(&self, id: &str) -> AppResult<DocumentRecord> {
        self.inner
            .index
            .get(id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }

    /// Replace a document's content, archiving the previous version.
    pub async fn update(
        &self,
        id: &str,
        content: &[u8],
        change_notes: Option<&str>,
    ) -> AppResult<DocumentRecord> {
        let known = self.get(id).await?;

        let _permit = self.admit().await?;
        let _guard = self
            .inner
            .locks
            .acquire(&known.path, LockKind::Write)
            .await?;
        let current = self.locked_record(id, &known.path).await?;

        self.inner.archive.snapshot(&current, change_notes).await;

        let outcome = self.inner.writer.write(&current.path, content).await?;
        let mut updated = current.clone();
        updated.revise(outcome.size, outcome.hash, Utc::now());

        self.inner.index.put(updated.clone()).await;
        if let Err(e) = self.inner.index.flush().await {
            self.inner.index.put(current).await;
            warn!(id, error = %e, "Index flush failed after content update");
            return Err(e);
        }

        info!(id, version = updated.version, bytes = updated.size, "Document updated");
        Ok(updated)
    }

    /// Delete a document, archiving its final state.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let known = self.get(id).await?;

        let _permit = self.admit().await?;
        let _guard = self
            .inner
            .locks
            .acquire(&known.path, LockKind::Write)
            .await?;
        let current = self.locked_record(id, &known.path).await?;

        self.inner.archive.snapshot(&current, None).await;

        match fs::remove_file(&current.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(id, path = %current.path.display(), "Content already missing on delete");
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete document: {}", current.path.display()),
                    e,
                ));
            }
        }

        self.inner.index.remove(id).await;
        if let Err(e) = self.inner.index.flush().await {
            self.inner.index.put(current).await;
            warn!(id, error = %e, "Index flush failed after delete");
            return Err(e);
        }

        info!(id, "Document deleted");
        Ok(())
    }

    /// Filter, sort, and paginate live documents.
    pub async fn list(&self, options: &ListOptions) -> Page<DocumentRecord> {
        query::run(self.inner.index.list_all().await, options)
    }

    /// Totals over live documents.
    pub async fn stats(&self) -> StorageStats {
        StorageStats::from_records(&self.inner.index.list_all().await)
    }

    /// Archived versions of `id`, oldest first. History outlives deletion.
    pub async fn history(&self, id: &str) -> AppResult<Vec<VersionSnapshot>> {
        self.inner.archive.history(id).await
    }

    /// Write an archived version back as a new revision.
    pub async fn restore(
        &self,
        id: &str,
        version: u32,
        change_notes: Option<&str>,
    ) -> AppResult<DocumentRecord> {
        self.get(id).await?;

        let snapshot = self
            .history(id)
            .await?
            .into_iter()
            .filter(|snapshot| snapshot.version() == version)
            .max_by_key(|snapshot| snapshot.backup_at)
            .ok_or_else(|| {
                AppError::not_found(format!("Version {version} of document {id} not found"))
            })?;
        let content = self.inner.archive.load_content(&snapshot).await?;

        let notes = change_notes
            .map(String::from)
            .unwrap_or_else(|| format!("Restored from version {version}"));
        self.update(id, &content, Some(&notes)).await
    }

    async fn resolve_document_path(&self, path: &Path) -> AppResult<PathBuf> {
        let documents = self.inner.config.documents_path();
        let not_found =
            || AppError::not_found(format!("Document not found: {}", path.display()));

        let file_name = path.file_name().ok_or_else(not_found)?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (parent, root) =
            tokio::try_join!(fs::canonicalize(parent), fs::canonicalize(&documents))
                .map_err(|_| not_found())?;

        if parent != root {
            return Err(AppError::validation(format!(
                "Path is outside the documents directory: {}",
                path.display()
            )));
        }
        Ok(documents.join(file_name))
    }

    /// Re-read `id` after its lock is held; it may have been deleted or
    /// re-created while this operation waited.
    async fn locked_record(&self, id: &str, locked_path: &Path) -> AppResult<DocumentRecord> {
        match self.inner.index.get(id).await {
            Some(record) if record.path == locked_path => Ok(record),
            Some(_) => Err(AppError::conflict(format!(
                "Document {id} was replaced concurrently"
            ))),
            None => Err(AppError::not_found(format!("Document {id} not found"))),
        }
    }

    async fn admit(&self) -> AppResult<Option<SemaphorePermit<'_>>> {
        match &self.inner.admission {
            Some(semaphore) => semaphore
                .acquire()
                .await
                .map(Some)
                .map_err(|_| AppError::internal("Admission semaphore closed")),
            None => Ok(None),
        }
    }
}

/// Ids become file-name prefixes in the version archive.
fn validate_id(id: &str) -> AppResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Invalid document id '{id}': use 1-128 ASCII letters, digits, '-', '_' or '.'"
        )))
    }
}

/// `{stem}-{nonce}{.ext}`, unique per store call.
fn unique_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    let (stem, ext) = match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (sanitized, None),
    };
    let stem: String = stem.chars().take(MAX_STEM_LEN).collect();
    let stem = if stem.is_empty() { "document".to_string() } else { stem };

    let nonce = Uuid::new_v4().simple().to_string();
    match ext {
        Some(ext) => format!("{stem}-{}.{ext}", &nonce[..12]),
        None => format!("{stem}-{}", &nonce[..12]),
    }
}

/// Metadata for a file the index does not know about.
async fn metadata_from_file(path: &Path, content: &[u8]) -> AppResult<DocumentRecord> {
    let stat = fs::metadata(path).await?;
    let modified_at: DateTime<Utc> = stat
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let created_at: DateTime<Utc> = stat.created().map(DateTime::from).unwrap_or(modified_at);
    let hash = content_hash(content);

    Ok(DocumentRecord {
        id: hash.clone(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: PathBuf::from(path),
        size: stat.len(),
        created_at,
        modified_at,
        content_hash: hash,
        version: 1,
        tags: Vec::new(),
        category: DEFAULT_CATEGORY.to_string(),
        author: None,
    })
}

async fn discard_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove orphaned document file");
    }
}
