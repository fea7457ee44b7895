//! Integration tests for concurrent access.

mod helpers;

use std::sync::Arc;

use docvault_core::error::ErrorKind;
use docvault_storage::hash::content_hash;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stores_never_corrupt_each_other() {
    let vault = Arc::new(helpers::TestVault::new().await);

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let vault = Arc::clone(&vault);
            tokio::spawn(async move {
                let body = format!("{n}:").repeat(4096);
                let record = vault.store_text(&format!("report-{n}.txt"), &body).await;
                (record, body)
            })
        })
        .collect();

    for joined in futures::future::join_all(tasks).await {
        let (record, body) = joined.unwrap();
        let read = vault.store.read(&record.path).await.unwrap();
        assert_eq!(content_hash(&read.content), content_hash(body.as_bytes()));
        assert_eq!(read.metadata.content_hash, record.content_hash);
    }

    let reopened = vault.reopen().await;
    assert_eq!(reopened.stats().await.total_documents, 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identical_concurrent_stores_create_distinct_documents() {
    let vault = Arc::new(helpers::TestVault::new().await);

    let tasks = (0..6).map(|_| {
        let vault = Arc::clone(&vault);
        async move { vault.store_text("same.txt", "same body").await }
    });
    let records = futures::future::join_all(tasks).await;

    let mut ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6);
    assert!(ids.contains(&content_hash(b"same body")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updates_to_one_document_are_serialized() {
    let vault = Arc::new(helpers::TestVault::new().await);
    let record = vault.store_text("counter.txt", "start").await;

    let tasks = (0..12).map(|n| {
        let vault = Arc::clone(&vault);
        let id = record.id.clone();
        async move {
            vault
                .store
                .update(&id, format!("writer {n}").as_bytes(), None)
                .await
                .unwrap()
        }
    });
    let results = futures::future::join_all(tasks).await;

    let mut versions: Vec<u32> = results.iter().map(|r| r.version).collect();
    versions.sort();
    assert_eq!(versions, (2..=13).collect::<Vec<_>>());

    let history = vault.store.history(&record.id).await.unwrap();
    assert_eq!(history.len(), 12);
    assert!(!vault.store.locks().is_locked(&record.path));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updates_to_different_documents_all_reach_the_index() {
    let vault = Arc::new(helpers::TestVault::new().await);
    let mut records = Vec::new();
    for n in 0..8 {
        records.push(vault.store_text(&format!("doc{n}.md"), "v1").await);
    }

    let tasks = records.iter().map(|record| {
        let vault = Arc::clone(&vault);
        let id = record.id.clone();
        async move { vault.store.update(&id, b"v2", None).await.unwrap() }
    });
    futures::future::join_all(tasks).await;

    let reopened = vault.reopen().await;
    for record in &records {
        assert_eq!(reopened.get(&record.id).await.unwrap().version, 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_versions_only() {
    let vault = Arc::new(helpers::TestVault::new().await);
    let old_body = "a".repeat(256 * 1024);
    let new_body = "b".repeat(128 * 1024);
    let record = vault.store_text("big.txt", &old_body).await;

    let writer = {
        let vault = Arc::clone(&vault);
        let id = record.id.clone();
        let new_body = new_body.clone();
        tokio::spawn(async move {
            vault.store.update(&id, new_body.as_bytes(), None).await.unwrap();
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let vault = Arc::clone(&vault);
            let path = record.path.clone();
            tokio::spawn(async move { vault.store.read(&path).await.unwrap() })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        let document = reader.await.unwrap();
        let body = std::str::from_utf8(&document.content).unwrap();
        assert!(body == old_body || body == new_body);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_update_leaves_consistent_state() {
    let vault = Arc::new(helpers::TestVault::new().await);
    let record = vault.store_text("contested.md", "v1").await;

    let update = {
        let vault = Arc::clone(&vault);
        let id = record.id.clone();
        tokio::spawn(async move { vault.store.update(&id, b"v2", None).await })
    };
    let delete = {
        let vault = Arc::clone(&vault);
        let id = record.id.clone();
        tokio::spawn(async move { vault.store.delete(&id).await })
    };

    let update = update.await.unwrap();
    delete.await.unwrap().unwrap();

    match update {
        Ok(updated) => assert_eq!(updated.version, 2),
        Err(e) => assert_eq!(e.kind, ErrorKind::NotFound),
    }
    assert!(vault.store.get(&record.id).await.unwrap_err().is_not_found());
    assert!(!record.path.exists());
    assert!(vault.reopen().await.get(&record.id).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admission_limit_still_completes_all_work() {
    let vault = Arc::new(
        helpers::TestVault::with_config(|config| config.max_concurrent_ops = 1).await,
    );

    let tasks = (0..8).map(|n| {
        let vault = Arc::clone(&vault);
        async move { vault.store_text(&format!("q{n}.txt"), &n.to_string()).await }
    });
    let records = futures::future::join_all(tasks).await;

    for record in &records {
        let restored = vault.store.read_document(&record.id).await.unwrap();
        assert_eq!(restored.metadata.version, 1);
    }
    assert_eq!(vault.store.stats().await.total_documents, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_locking_disabled_still_serves_requests() {
    let vault = helpers::TestVault::with_config(|config| config.locking_enabled = false).await;
    let record = vault.store_text("free.md", "one").await;

    vault.store.update(&record.id, b"two", None).await.unwrap();

    assert!(vault.store.locks().held().is_empty());
    assert_eq!(vault.read_text(&record).await, "two");
}
