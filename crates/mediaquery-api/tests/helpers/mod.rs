//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process against the in-memory catalog; no AWS credentials or
//! database are needed.

#![allow(dead_code)]

use axum_test::TestServer;
use mediaquery_api::{setup_routes, AppState};
use mediaquery_core::{Config, Label, MediaType};
use mediaquery_db::{CatalogStore, InMemoryCatalogStore};
use std::collections::HashMap;
use std::sync::Arc;

pub const BUCKET: &str = "media-bucket";

/// Configuration as the binary would load it, with the in-memory backend
pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("MEDIA_BUCKET_NAME", BUCKET),
        ("CATALOG_BACKEND", "memory"),
        ("ENVIRONMENT", "test"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration should load")
}

/// Test application: server plus direct access to the catalog behind it.
pub struct TestApp {
    pub server: TestServer,
    pub catalog: Arc<InMemoryCatalogStore>,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(Arc::new(InMemoryCatalogStore::new()))
}

pub fn setup_test_app_with(catalog: Arc<InMemoryCatalogStore>) -> TestApp {
    let config = test_config();
    let state = AppState::new(catalog.clone(), config.clone());
    let router = setup_routes(&config, state).expect("router should build");
    let server = TestServer::new(router.into_make_service()).expect("test server should start");
    TestApp { server, catalog }
}

/// Catalog with `a.jpg:[cat]`, `ab.png:[dog]`, `z.jpg:[cat, dog]`
pub async fn seed_fixtures(catalog: &dyn CatalogStore) {
    catalog
        .upsert("a.jpg", MediaType::Image, &[Label::new("cat")])
        .await
        .unwrap();
    catalog
        .upsert("ab.png", MediaType::Image, &[Label::new("dog")])
        .await
        .unwrap();
    catalog
        .upsert(
            "z.jpg",
            MediaType::Image,
            &[Label::new("cat"), Label::new("dog")],
        )
        .await
        .unwrap();
}

pub fn names(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .expect("listing should be a JSON array")
        .iter()
        .map(|entry| entry["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
