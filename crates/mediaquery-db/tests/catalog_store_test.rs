//! Behavioral tests for the catalog store contract, run against the in-memory backend.
//!
//! The same checks run against PostgreSQL and DynamoDB Local in
//! `catalog_backends_test.rs`.

mod common;

use common::names;
use mediaquery_core::{AppError, Label, ListFilter, MediaType};
use mediaquery_db::{CatalogStore, InMemoryCatalogStore};
use std::sync::Arc;

#[tokio::test]
async fn test_round_trip() {
    common::check_round_trip(&InMemoryCatalogStore::new()).await;
}

#[tokio::test]
async fn test_overwrite_and_idempotence() {
    let store = InMemoryCatalogStore::new();
    common::check_overwrite_and_idempotence(&store).await;
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_delete_removes_and_tolerates_absent() {
    common::check_delete(&InMemoryCatalogStore::new()).await;
}

#[tokio::test]
async fn test_list_filters_and_ordering() {
    common::check_filters(&InMemoryCatalogStore::new()).await;
}

#[tokio::test]
async fn test_label_filter_is_exact_match() {
    common::check_label_is_exact_match(&InMemoryCatalogStore::new()).await;
}

#[tokio::test]
async fn test_prefix_literal_and_codepoint_order() {
    common::check_prefix_literal_and_codepoint_order(&InMemoryCatalogStore::new()).await;
}

#[tokio::test]
async fn test_label_index_follows_overwrite_and_delete() {
    let store = InMemoryCatalogStore::new();
    store
        .upsert("a.jpg", MediaType::Image, &[Label::new("cat")])
        .await
        .unwrap();
    store
        .upsert("a.jpg", MediaType::Image, &[Label::new("dog")])
        .await
        .unwrap();

    assert!(store.list(&ListFilter::new().label("cat")).await.unwrap().is_empty());
    assert_eq!(
        names(&store.list(&ListFilter::new().label("dog")).await.unwrap()),
        vec!["a.jpg"]
    );

    store.delete("a.jpg").await.unwrap();
    assert!(store.list(&ListFilter::new().label("dog")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_check_and_backend_name() {
    let store = InMemoryCatalogStore::new();
    store.health_check().await.unwrap();
    assert_eq!(store.backend_name(), "memory");
}

#[tokio::test]
async fn test_concurrent_upserts_on_distinct_keys() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .upsert(&format!("img-{:02}.jpg", i), MediaType::Image, &[Label::new("x")])
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = store.list(&ListFilter::new().label("x")).await.unwrap();
    assert_eq!(entries.len(), 32);
    assert_eq!(entries[0].name, "img-00.jpg");
    assert_eq!(entries[31].name, "img-31.jpg");
}

#[test]
fn test_not_found_error_wording() {
    let err = AppError::media_not_found("a.jpg");
    assert_eq!(err.to_string(), "Media file (a.jpg) not found");
}
