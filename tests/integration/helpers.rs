//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use docvault_core::config::StorageConfig;
use docvault_entity::document::{DocumentRecord, StoreRequest};
use docvault_storage::DocumentStore;

/// Test vault: an initialized store over a private temp directory
pub struct TestVault {
    /// The store under test
    pub store: DocumentStore,
    /// Storage configuration the store was opened with
    pub config: StorageConfig,
    /// Keeps the directory alive for the test's duration
    dir: TempDir,
}

impl TestVault {
    /// Create a vault with default settings
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a vault after adjusting the default configuration
    pub async fn with_config(adjust: impl FnOnce(&mut StorageConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = StorageConfig::with_base_dir(dir.path());
        adjust(&mut config);

        let store = open(config.clone()).await;
        Self { store, config, dir }
    }

    /// Open a second store over the same directory, as after a restart
    pub async fn reopen(&self) -> DocumentStore {
        open(self.config.clone()).await
    }

    /// Base directory of the vault
    pub fn base_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Store text content with default metadata
    pub async fn store_text(&self, name: &str, body: &str) -> DocumentRecord {
        self.store
            .store(name, body.as_bytes(), StoreRequest::new())
            .await
            .expect("Failed to store document")
    }

    /// Store text content with tags
    pub async fn store_tagged(&self, name: &str, body: &str, tags: &[&str]) -> DocumentRecord {
        let request = tags
            .iter()
            .fold(StoreRequest::new(), |request, tag| request.with_tag(*tag));
        self.store
            .store(name, body.as_bytes(), request)
            .await
            .expect("Failed to store document")
    }

    /// Read a document's content as UTF-8
    pub async fn read_text(&self, record: &DocumentRecord) -> String {
        let document = self
            .store
            .read(&record.path)
            .await
            .expect("Failed to read document");
        String::from_utf8(document.content.to_vec()).expect("Content is not UTF-8")
    }

    /// Names of the files in one of the vault's directories, sorted
    pub async fn files_in(&self, dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return names;
        };
        while let Some(entry) = entries.next_entry().await.expect("Failed to list dir") {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        names
    }

    /// Path of the versions directory
    pub fn versions_dir(&self) -> PathBuf {
        self.config.versions_path()
    }

    /// Path of the documents directory
    pub fn documents_dir(&self) -> PathBuf {
        self.config.documents_path()
    }
}

async fn open(config: StorageConfig) -> DocumentStore {
    let store = DocumentStore::new(config).expect("Invalid storage config");
    store.initialize().await.expect("Failed to initialize store");
    store
}
