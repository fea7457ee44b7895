//! Integration tests for the document lifecycle.

mod helpers;

use docvault_core::error::ErrorKind;
use docvault_entity::document::StoreRequest;
use docvault_storage::hash::content_hash;

#[tokio::test]
async fn test_store_read_round_trip() {
    let vault = helpers::TestVault::new().await;

    let large = "x".repeat(64 * 1024);
    for body in ["", "plain text", "ünïcödé ✓", large.as_str()] {
        let record = vault.store_text("doc.txt", body).await;
        assert_eq!(vault.read_text(&record).await, body);
        assert_eq!(record.size, body.len() as u64);
        assert_eq!(record.content_hash, content_hash(body.as_bytes()));
    }
}

#[tokio::test]
async fn test_binary_content_round_trip() {
    let vault = helpers::TestVault::new().await;
    let body: Vec<u8> = (0..=255).collect();

    let record = vault
        .store
        .store("blob.bin", &body, StoreRequest::new().with_category("binary"))
        .await
        .unwrap();

    let read = vault.store.read_document(&record.id).await.unwrap();
    assert_eq!(read.content.to_vec(), body);
    assert_eq!(read.metadata.category, "binary");
}

#[tokio::test]
async fn test_version_counts_updates_and_snapshots() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("notes.md", "draft 0").await;

    for n in 1..=5 {
        let updated = vault
            .store
            .update(&record.id, format!("draft {n}").as_bytes(), None)
            .await
            .unwrap();
        assert_eq!(updated.version, 1 + n);
    }

    let history = vault.store.history(&record.id).await.unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(vault.read_text(&record).await, "draft 5");

    // Each snapshot holds the content that was replaced.
    for snapshot in &history {
        let path = &snapshot.backup_path;
        let archived = tokio::fs::read_to_string(path).await.unwrap();
        assert_eq!(archived, format!("draft {}", snapshot.version() - 1));
    }
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("gone.md", "soon gone").await;

    vault.store.delete(&record.id).await.unwrap();

    let err = vault.store.read(&record.path).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = vault.store.read_document(&record.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!record.path.exists());

    let history = vault.store.history(&record.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.version, 1);
}

#[tokio::test]
async fn test_update_missing_id_creates_no_snapshot() {
    let vault = helpers::TestVault::new().await;

    let err = vault
        .store
        .update("does-not-exist", b"content", Some("note"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(vault.files_in(&vault.versions_dir()).await.is_empty());
    assert!(vault.store.history("does-not-exist").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_supplied_id_and_metadata_survive_restart() {
    let vault = helpers::TestVault::new().await;
    let record = vault
        .store
        .store(
            "Runbook.md",
            b"step 1",
            StoreRequest::new()
                .with_id("runbook")
                .with_tag("ops")
                .with_category("guides")
                .with_author("oncall"),
        )
        .await
        .unwrap();
    assert_eq!(record.id, "runbook");

    let reopened = vault.reopen().await;
    let loaded = reopened.get("runbook").await.unwrap();
    assert_eq!(loaded, record);

    let updated = reopened.update("runbook", b"step 2", None).await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.author.as_deref(), Some("oncall"));
}

#[tokio::test]
async fn test_supplied_id_can_be_reused_after_delete() {
    let vault = helpers::TestVault::new().await;
    let request = || StoreRequest::new().with_id("weekly");

    vault.store.store("w1.md", b"one", request()).await.unwrap();
    let err = vault.store.store("w2.md", b"two", request()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    vault.store.delete("weekly").await.unwrap();
    let second = vault.store.store("w2.md", b"two", request()).await.unwrap();
    assert_eq!(second.version, 1);
    assert_eq!(vault.read_text(&second).await, "two");
}

#[tokio::test]
async fn test_restore_round_trip() {
    let vault = helpers::TestVault::new().await;
    let record = vault.store_text("policy.md", "v1 text").await;
    vault
        .store
        .update(&record.id, b"v2 text", Some("rewrite"))
        .await
        .unwrap();

    let restored = vault
        .store
        .restore(&record.id, 1, Some("rollback"))
        .await
        .unwrap();

    assert_eq!(restored.version, 3);
    assert_eq!(restored.content_hash, content_hash(b"v1 text"));
    assert_eq!(vault.read_text(&record).await, "v1 text");

    let notes: Vec<_> = vault
        .store
        .history(&record.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.change_notes)
        .collect();
    assert_eq!(notes, vec![Some("rewrite".to_string()), Some("rollback".to_string())]);
}

#[tokio::test]
async fn test_retention_keeps_newest_snapshots() {
    let vault = helpers::TestVault::with_config(|config| {
        config.retention.keep_latest = Some(2);
    })
    .await;
    let record = vault.store_text("log.md", "0").await;

    for n in 1..=4 {
        vault
            .store
            .update(&record.id, n.to_string().as_bytes(), None)
            .await
            .unwrap();
    }

    let versions: Vec<u32> = vault
        .store
        .history(&record.id)
        .await
        .unwrap()
        .iter()
        .map(|s| s.version())
        .collect();
    assert_eq!(versions, vec![3, 4]);
    assert_eq!(vault.store.get(&record.id).await.unwrap().version, 5);
}
