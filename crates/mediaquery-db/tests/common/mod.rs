//! Catalog store contract shared by every backend's tests.
//!
//! Each check expects an empty store and leaves data behind, so callers hand every
//! check its own store (or table).

#![allow(dead_code)]

use mediaquery_core::{Label, ListFilter, MediaEntry, MediaType};
use mediaquery_db::CatalogStore;

pub fn names(entries: &[MediaEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// `a.jpg:[cat]`, `ab.png:[dog]`, `z.jpg:[cat, dog]`, inserted out of order
pub async fn seed(store: &dyn CatalogStore) {
    store
        .upsert("z.jpg", MediaType::Image, &[Label::new("cat"), Label::new("dog")])
        .await
        .unwrap();
    store
        .upsert("a.jpg", MediaType::Image, &[Label::new("cat")])
        .await
        .unwrap();
    store
        .upsert("ab.png", MediaType::Image, &[Label::new("dog")])
        .await
        .unwrap();
}

pub async fn check_round_trip(store: &dyn CatalogStore) {
    let labels = vec![Label::with_confidence("beach", 98.25), Label::new("sea")];

    store
        .upsert("holiday/beach.jpg", MediaType::Image, &labels)
        .await
        .unwrap();

    let entry = store.get("holiday/beach.jpg").await.unwrap().unwrap();
    assert_eq!(entry.name, "holiday/beach.jpg");
    assert_eq!(entry.media_type, MediaType::Image);
    assert_eq!(entry.labels, labels);
    assert!(store.get("missing.jpg").await.unwrap().is_none());
}

pub async fn check_overwrite_and_idempotence(store: &dyn CatalogStore) {
    store
        .upsert("a.jpg", MediaType::Image, &[Label::new("cat")])
        .await
        .unwrap();
    for _ in 0..3 {
        store
            .upsert("a.jpg", MediaType::Image, &[Label::new("dog")])
            .await
            .unwrap();
    }

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].labels, vec![Label::new("dog")]);
}

pub async fn check_delete(store: &dyn CatalogStore) {
    seed(store).await;

    store.delete("a.jpg").await.unwrap();
    assert!(store.get("a.jpg").await.unwrap().is_none());

    // Deleting again, or deleting something never stored, still succeeds
    store.delete("a.jpg").await.unwrap();
    store.delete("never-stored.png").await.unwrap();

    assert_eq!(names(&store.list_all().await.unwrap()), vec!["ab.png", "z.jpg"]);
}

pub async fn check_filters(store: &dyn CatalogStore) {
    seed(store).await;

    assert_eq!(
        names(&store.list_all().await.unwrap()),
        vec!["a.jpg", "ab.png", "z.jpg"]
    );

    let by_prefix = store.list(&ListFilter::new().startswith("a")).await.unwrap();
    assert_eq!(names(&by_prefix), vec!["a.jpg", "ab.png"]);

    let by_label = store.list(&ListFilter::new().label("dog")).await.unwrap();
    assert_eq!(names(&by_label), vec!["ab.png", "z.jpg"]);

    let by_type_and_label = store
        .list(&ListFilter::new().media_type(MediaType::Image).label("cat"))
        .await
        .unwrap();
    assert_eq!(names(&by_type_and_label), vec!["a.jpg", "z.jpg"]);

    let combined = store
        .list(&ListFilter::new().startswith("a").label("dog"))
        .await
        .unwrap();
    assert_eq!(names(&combined), vec!["ab.png"]);

    let videos = store
        .list(&ListFilter::new().media_type(MediaType::Video))
        .await
        .unwrap();
    assert!(videos.is_empty());

    let everything = store.list(&ListFilter::new().startswith("")).await.unwrap();
    assert_eq!(everything.len(), 3);
}

pub async fn check_label_is_exact_match(store: &dyn CatalogStore) {
    seed(store).await;
    store.upsert("blank.png", MediaType::Image, &[]).await.unwrap();

    assert!(store.list(&ListFilter::new().label("Cat")).await.unwrap().is_empty());
    assert!(store.list(&ListFilter::new().label("ca")).await.unwrap().is_empty());
    assert_eq!(store.list_all().await.unwrap().len(), 4);
}

/// Prefixes are literal and ordering is by code point, not locale
pub async fn check_prefix_literal_and_codepoint_order(store: &dyn CatalogStore) {
    for name in ["b.jpg", "Z.jpg", "100%_a.jpg", "100xa.jpg", "é.png"] {
        store.upsert(name, MediaType::Image, &[]).await.unwrap();
    }

    assert_eq!(
        names(&store.list_all().await.unwrap()),
        vec!["100%_a.jpg", "100xa.jpg", "Z.jpg", "b.jpg", "é.png"]
    );

    let literal = store.list(&ListFilter::new().startswith("100%_")).await.unwrap();
    assert_eq!(names(&literal), vec!["100%_a.jpg"]);

    let case_sensitive = store.list(&ListFilter::new().startswith("z")).await.unwrap();
    assert!(case_sensitive.is_empty());
}
