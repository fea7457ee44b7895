//! Integration tests for crash recovery and damaged on-disk state.

mod helpers;

use std::path::{Path, PathBuf};

use docvault_core::error::ErrorKind;

const NONCE: &str = "0123456789abcdef0123456789abcdef";

/// Leave a half-written temp file next to `path`, as an interrupted write would.
async fn leave_partial_write(path: &Path, partial: &[u8]) -> PathBuf {
    let mut temp = path.as_os_str().to_os_string();
    temp.push(format!(".tmp.{NONCE}"));
    let temp = PathBuf::from(temp);
    tokio::fs::write(&temp, partial).await.unwrap();
    temp
}

#[tokio::test]
async fn test_interrupted_update_keeps_original_content() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("contract.md", "signed original").await;
    let temp = leave_partial_write(&record.path, b"half of the new ver").await;

    assert_eq!(vault.read_text(&record).await, "signed original");

    let reopened = vault.reopen().await;
    assert!(!temp.exists());
    let read = reopened.read(&record.path).await.unwrap();
    assert_eq!(&read.content[..], b"signed original");
    assert_eq!(read.metadata, record);
}

#[tokio::test]
async fn test_interrupted_first_write_leaves_nothing_behind() {
    let vault = helpers::TestVault::new().await;
    let path = vault.documents_dir().join("never-finished.md");
    let temp = leave_partial_write(&path, b"partial").await;

    let err = vault.store.read(&path).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let reopened = vault.reopen().await;
    assert!(!temp.exists());
    assert_eq!(reopened.stats().await.total_documents, 0);
}

#[tokio::test]
async fn test_index_is_replaced_atomically() {
    let vault = helpers::TestVault::new().await;
    vault.store_text("a.md", "a").await;
    vault.store_text("b.md", "b").await;

    let metadata_files = vault.files_in(&vault.config.metadata_path()).await;
    assert_eq!(metadata_files, vec!["index.json"]);

    let raw = tokio::fs::read(vault.config.index_file()).await.unwrap();
    let index: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(index.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_index_starts_empty_and_is_preserved() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("a.md", "a").await;
    tokio::fs::write(vault.config.index_file(), b"{\"truncated\": ")
        .await
        .unwrap();

    let reopened = vault.reopen().await;
    assert_eq!(reopened.stats().await.total_documents, 0);
    assert!(reopened.get(&record.id).await.unwrap_err().is_not_found());

    let preserved = vault
        .files_in(&vault.config.metadata_path())
        .await
        .into_iter()
        .any(|name| name.starts_with("index.json.corrupt."));
    assert!(preserved);

    // The live content is still readable, with regenerated metadata.
    let read = reopened.read(&record.path).await.unwrap();
    assert_eq!(read.metadata.content_hash, record.content_hash);
    assert_eq!(read.metadata.version, 1);

    reopened
        .store("b.md", b"b", Default::default())
        .await
        .unwrap();
    assert_eq!(vault.reopen().await.stats().await.total_documents, 1);
}

#[tokio::test]
async fn test_update_after_content_vanished() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("fragile.md", "v1").await;
    tokio::fs::remove_file(&record.path).await.unwrap();

    let err = vault.store.read(&record.path).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The snapshot cannot be taken, but the update itself proceeds.
    let updated = vault.store.update(&record.id, b"v2", None).await.unwrap();
    assert_eq!(updated.version, 2);
    assert!(vault.store.history(&record.id).await.unwrap().is_empty());
    assert_eq!(vault.read_text(&updated).await, "v2");
}

#[tokio::test]
async fn test_delete_tolerates_missing_content() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("orphan.md", "v1").await;
    tokio::fs::remove_file(&record.path).await.unwrap();

    vault.store.delete(&record.id).await.unwrap();

    assert!(vault.store.get(&record.id).await.unwrap_err().is_not_found());
    assert!(vault.reopen().await.get(&record.id).await.is_err());
}
