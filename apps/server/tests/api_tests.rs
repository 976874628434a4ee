//! Integration tests for the clipdex-server API, run against an in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use clipdex_core::MemoryStore;
use clipdex_server::{AppState, build_router};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot` method

const CATALOG: &str = "categorized_videos.json";

fn catalog_json(rows: usize) -> String {
    let entries: Vec<Value> = (0..rows)
        .map(|i| {
            let tags = if i % 3 == 0 { vec!["cats", "pets"] } else { vec!["cooking"] };
            json!({
                "source_json_path": format!("t/v{i}.json"),
                "video_uri": format!("/toktiks/videos/v{i}.mp4"),
                "summary": format!("Video number {i}"),
                "tags": tags,
                "char_count": 10,
            })
        })
        .collect();
    Value::Array(entries).to_string()
}

fn setup_app(store: MemoryStore) -> axum::Router {
    build_router(AppState::new(Arc::new(store), CATALOG))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn health_does_not_need_a_catalog() {
    let app = setup_app(MemoryStore::new("toktiks"));

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "clipdex-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn first_page_uses_default_page_size() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(45)));

    let response = app.oneshot(test_request("GET", "/api/videos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 45);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 20);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 20);

    let first = &body["items"][0];
    assert_eq!(first["id"], "t/v0.json");
    assert_eq!(first["videoUri"], "/toktiks/videos/v0.mp4");
    assert_eq!(first["fileName"], "videos/v0.mp4");
    assert!(
        first["signedUrl"]
            .as_str()
            .unwrap()
            .starts_with("memory://toktiks/videos/v0.mp4")
    );
    assert!(first["warning"].is_null());

    assert_eq!(body["availableTags"], json!(["cats", "cooking", "pets"]));
    assert!(body["tagCounts"].is_object());
    assert_eq!(body["tagCounts"]["cooking"], 30);
    assert_eq!(body["topTags"][0], json!({"tag": "cooking", "count": 30}));
}

#[tokio::test]
async fn page_past_the_end_is_clamped() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(45)));

    let response = app
        .oneshot(test_request("GET", "/api/videos?page=9"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["items"][0]["id"], "t/v40.json");
}

#[tokio::test]
async fn search_and_tags_combine() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(45)));

    let response = app
        .oneshot(test_request("GET", "/api/videos?search=NUMBER%201&tags=pets,%20dogs"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    // Rows 12, 15, 18 are tagged pets and their summaries contain "number 1".
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["t/v12.json", "t/v15.json", "t/v18.json"]);
    assert_eq!(body["total"], 3);
    // Tag counts ignore filters.
    assert_eq!(body["tagCounts"], json!({"cats": 15, "cooking": 30, "pets": 15}));
}

#[tokio::test]
async fn padded_search_matches_like_trimmed() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(45)));

    let response = app
        .oneshot(test_request("GET", "/api/videos?search=%20%20number%2044%20"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], "t/v44.json");
}

#[tokio::test]
async fn signing_failure_only_marks_that_row() {
    let store = MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(2));
    store.fail_signing("videos/v1.mp4");
    let app = setup_app(store);

    let response = app.oneshot(test_request("GET", "/api/videos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["items"][0]["warning"].is_null());
    assert_eq!(body["items"][1]["signedUrl"], "");
    assert!(
        body["items"][1]["warning"]
            .as_str()
            .unwrap()
            .starts_with("Could not load video")
    );
}

#[tokio::test]
async fn broken_catalog_is_service_unavailable() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, "{not json"));

    let response = app.oneshot(test_request("GET", "/api/videos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CATALOG_UNAVAILABLE");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn missing_catalog_is_service_unavailable() {
    let app = setup_app(MemoryStore::new("toktiks"));

    let response = app.oneshot(test_request("GET", "/api/videos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn malformed_page_is_bad_request() {
    let app = setup_app(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(1)));

    let response = app
        .oneshot(test_request("GET", "/api/videos?page=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reload_picks_up_a_new_build() {
    let store = Arc::new(MemoryStore::new("toktiks").with_object(CATALOG, catalog_json(1)));
    let app = build_router(AppState::new(store.clone(), CATALOG));

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/videos"))
        .await
        .unwrap();
    assert_eq!(extract_json(response.into_body()).await["total"], 1);

    store.put(CATALOG, catalog_json(4));
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/videos"))
        .await
        .unwrap();
    assert_eq!(extract_json(response.into_body()).await["total"], 1);

    let response = app
        .oneshot(test_request("POST", "/api/catalog/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["entries"], 4);
}
