//! Integration tests for listing, search, and statistics.

mod helpers;

use chrono::{Duration, Utc};
use docvault_core::types::SortDirection;
use docvault_entity::document::{DEFAULT_CATEGORY, StoreRequest};
use docvault_storage::{DateRange, ListOptions, SortKey};

fn by_name() -> ListOptions {
    ListOptions::default().sorted_by(SortKey::Name, SortDirection::Asc)
}

#[tokio::test]
async fn test_alpha_beta_scenario() {
    let vault = helpers::TestVault::new().await;
    vault.store_tagged("alpha", "1", &["x"]).await;
    vault.store_tagged("beta", "2", &["x"]).await;
    vault.store_tagged("alpha2", "3", &[]).await;

    let page = vault.store.list(&by_name().with_query("alpha")).await;
    let names: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "alpha2"]);

    let page = vault.store.list(&by_name().with_tags(["x"])).await;
    let names: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_query_returns_exact_matching_subset() {
    let vault = helpers::TestVault::new().await;
    vault.store_tagged("Quarterly Report", "q", &["finance"]).await;
    vault.store_tagged("notes", "n", &["REPORTING"]).await;
    vault.store_tagged("todo", "t", &["misc"]).await;

    let all = vault.store.list(&ListOptions::default().with_query("")).await;
    assert_eq!(all.total, 3);

    let page = vault.store.list(&by_name().with_query("rEpOrT")).await;
    let names: Vec<_> = page.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Quarterly Report", "notes"]);

    for record in vault.store.list(&ListOptions::default()).await.records {
        let expected = record.name.to_lowercase().contains("report")
            || record.tags.iter().any(|t| t.to_lowercase().contains("report"));
        let returned = page.records.iter().any(|r| r.id == record.id);
        assert_eq!(expected, returned);
    }
}

#[tokio::test]
async fn test_pages_reconstruct_the_sorted_set() {
    let vault = helpers::TestVault::new().await;
    for n in 0..7 {
        vault.store_text(&format!("doc-{n}"), &"x".repeat(n + 1)).await;
    }

    let ordered = ListOptions::default().sorted_by(SortKey::Size, SortDirection::Desc);
    let full: Vec<String> = vault
        .store
        .list(&ordered.clone().paged(0, 100))
        .await
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(full.len(), 7);

    let mut collected = Vec::new();
    let mut offset = 0;
    loop {
        let page = vault.store.list(&ordered.clone().paged(offset, 2)).await;
        assert_eq!(page.total, 7);
        collected.extend(page.records.into_iter().map(|r| r.id));
        if !page.has_more {
            break;
        }
        offset += 2;
    }
    assert_eq!(collected, full);

    let beyond = vault.store.list(&ordered.paged(50, 2)).await;
    assert!(beyond.records.is_empty());
    assert!(!beyond.has_more);
}

#[tokio::test]
async fn test_category_and_date_filters() {
    let vault = helpers::TestVault::new().await;
    let before = Utc::now() - Duration::seconds(1);
    vault
        .store
        .store("architecture.md", b"s", StoreRequest::new().with_category("design"))
        .await
        .unwrap();
    vault.store_text("misc.md", "m").await;

    let design = vault.store.list(&ListOptions::default().with_category("design")).await;
    assert_eq!(design.total, 1);
    assert_eq!(design.records[0].name, "architecture.md");

    let recent = DateRange {
        start: Some(before),
        end: None,
    };
    let page = vault.store.list(&ListOptions::default().with_date_range(recent)).await;
    assert_eq!(page.total, 2);

    let past = DateRange {
        start: None,
        end: Some(before),
    };
    let page = vault.store.list(&ListOptions::default().with_date_range(past)).await;
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_default_order_is_most_recently_modified_first() {
    let vault = helpers::TestVault::new().await;
    let first = vault.store_text("first.md", "1").await;
    let second = vault.store_text("second.md", "2").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    vault.store.update(&first.id, b"1b", None).await.unwrap();

    let page = vault.store.list(&ListOptions::default()).await;
    let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
}

#[tokio::test]
async fn test_stats_track_live_documents() {
    let vault = helpers::TestVault::new().await;
    assert_eq!(vault.store.stats().await.total_documents, 0);
    assert!(vault.store.stats().await.last_modified.is_none());

    let a = vault.store_text("a.md", "aaaa").await;
    vault
        .store
        .store("b.md", b"bb", StoreRequest::new().with_category("notes"))
        .await
        .unwrap();
    let updated = vault.store.update(&a.id, b"a", None).await.unwrap();

    let stats = vault.store.stats().await;
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.total_size, 3);
    assert_eq!(stats.counts_by_category[DEFAULT_CATEGORY], 1);
    assert_eq!(stats.counts_by_category["notes"], 1);
    assert_eq!(stats.last_modified, Some(updated.modified_at));

    vault.store.delete(&a.id).await.unwrap();
    let stats = vault.store.stats().await;
    assert_eq!(stats.total_documents, 1);
    assert!(!stats.counts_by_category.contains_key(DEFAULT_CATEGORY));
}
