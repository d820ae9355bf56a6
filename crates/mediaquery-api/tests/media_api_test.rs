//! Query API integration tests.
//!
//! Run with: `cargo test -p mediaquery-api --test media_api_test`

mod helpers;

use helpers::{names, seed_fixtures, setup_test_app};
use mediaquery_core::{Label, MediaType};
use mediaquery_db::CatalogStore;
use serde_json::json;

#[tokio::test]
async fn test_list_empty_catalog() {
    let app = setup_test_app();

    let response = app.server.get("/").await;

    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn test_list_all_is_ordered_by_name() {
    let app = setup_test_app();
    seed_fixtures(app.catalog.as_ref()).await;

    let response = app.server.get("/").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(names(&body), vec!["a.jpg", "ab.png", "z.jpg"]);
    assert_eq!(
        body[0],
        json!({
            "name": "a.jpg",
            "media_type": "image",
            "labels": [{ "name": "cat" }]
        })
    );
}

#[tokio::test]
async fn test_list_filters() {
    let app = setup_test_app();
    seed_fixtures(app.catalog.as_ref()).await;

    let by_prefix: serde_json::Value = app
        .server
        .get("/")
        .add_query_param("startswith", "a")
        .await
        .json();
    assert_eq!(names(&by_prefix), vec!["a.jpg", "ab.png"]);

    let by_label: serde_json::Value = app
        .server
        .get("/")
        .add_query_param("label", "dog")
        .await
        .json();
    assert_eq!(names(&by_label), vec!["ab.png", "z.jpg"]);

    let by_type_and_label: serde_json::Value = app
        .server
        .get("/")
        .add_query_param("media-type", "image")
        .add_query_param("label", "cat")
        .await
        .json();
    assert_eq!(names(&by_type_and_label), vec!["a.jpg", "z.jpg"]);

    let videos: serde_json::Value = app
        .server
        .get("/")
        .add_query_param("media-type", "video")
        .await
        .json();
    assert!(names(&videos).is_empty());
}

#[tokio::test]
async fn test_unknown_query_params_are_dropped() {
    let app = setup_test_app();
    seed_fixtures(app.catalog.as_ref()).await;

    let response = app
        .server
        .get("/")
        .add_query_param("color", "red")
        .add_query_param("media_type", "video")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(names(&body), vec!["a.jpg", "ab.png", "z.jpg"]);
}

#[tokio::test]
async fn test_unknown_media_type_matches_nothing() {
    let app = setup_test_app();
    seed_fixtures(app.catalog.as_ref()).await;

    let response = app
        .server
        .get("/")
        .add_query_param("media-type", "IMAGE")
        .await;

    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn test_repeated_param_uses_last_value() {
    let app = setup_test_app();
    seed_fixtures(app.catalog.as_ref()).await;

    let response = app
        .server
        .get("/")
        .add_query_param("label", "cat")
        .add_query_param("label", "dog")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(names(&body), vec!["ab.png", "z.jpg"]);
}

#[tokio::test]
async fn test_get_existing_entry() {
    let app = setup_test_app();
    app.catalog
        .upsert(
            "beach.jpg",
            MediaType::Image,
            &[Label::with_confidence("sand", 90.0)],
        )
        .await
        .unwrap();

    let response = app.server.get("/beach.jpg").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "name": "beach.jpg",
        "media_type": "image",
        "labels": [{ "name": "sand", "confidence": 90.0 }]
    }));
}

#[tokio::test]
async fn test_get_missing_entry_is_not_found() {
    let app = setup_test_app();

    let response = app.server.get("/missing-name").await;

    response.assert_status_not_found();
    response.assert_json(&json!({
        "Code": "NotFoundError",
        "Message": "Media file (missing-name) not found"
    }));
}

#[tokio::test]
async fn test_get_name_with_slashes() {
    let app = setup_test_app();
    app.catalog
        .upsert("holiday/2026/beach.png", MediaType::Image, &[])
        .await
        .unwrap();

    let response = app.server.get("/holiday/2026/beach.png").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "holiday/2026/beach.png");
}

#[tokio::test]
async fn test_get_percent_encoded_name() {
    let app = setup_test_app();
    app.catalog
        .upsert("my beach.jpg", MediaType::Image, &[])
        .await
        .unwrap();

    let response = app.server.get("/my%20beach.jpg").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "my beach.jpg");
}

#[tokio::test]
async fn test_healthz_and_openapi() {
    let app = setup_test_app();

    let health = app.server.get("/healthz").await;
    health.assert_status_ok();
    health.assert_json(&json!({ "status": "ok" }));

    let doc: serde_json::Value = app.server.get("/openapi.json").await.json();
    assert_eq!(doc["info"]["title"], "Media Query API");
    assert!(doc["paths"]["/{name}"].is_object());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = setup_test_app();

    let response = app
        .server
        .get("/healthz")
        .add_header("X-Request-ID", "req-42")
        .await;

    assert_eq!(response.header("X-Request-ID"), "req-42");
}
