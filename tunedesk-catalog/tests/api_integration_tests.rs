//! Integration tests for the tunedesk-catalog HTTP API

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::{memory_pool, track_at, FakeObjectStore, ScriptedDecoder};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use tunedesk_catalog::db::{SqliteTrackStore, TrackStore};
use tunedesk_catalog::{build_router, AppState};
use tunedesk_common::config::CatalogConfig;
use tunedesk_common::db::{Track, TrackStatus};
use tunedesk_common::events::EventBus;

struct TestApp {
    router: axum::Router,
    store: Arc<SqliteTrackStore>,
    objects: Arc<FakeObjectStore>,
}

/// Test helper: app over an in-memory database, fake bucket and fake decoder
async fn create_test_app(decoded_seconds: f64) -> TestApp {
    let store = Arc::new(SqliteTrackStore::new(memory_pool().await));
    let objects = Arc::new(
        FakeObjectStore::default()
            .with_object("1-a.mp3", 1_000)
            .with_object("2-b.mp3", 1_000),
    );
    let state = AppState::with_stores(
        store.clone(),
        objects.clone(),
        Arc::new(ScriptedDecoder::returning(decoded_seconds)),
        &CatalogConfig::default(),
        EventBus::new(100),
    );

    TestApp {
        router: build_router(state),
        store,
        objects,
    }
}

async fn seed(app: &TestApp, track: Track) -> Track {
    app.store.insert_track(&track).await.unwrap();
    track
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(200.0).await;

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "tunedesk-catalog");
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_list_tracks_with_filters() {
    let app = create_test_app(200.0).await;
    seed(&app, track_at("Midnight Rain", "1-a.mp3", 200)).await;
    let mut draft = track_at("Sunrise", "2-b.mp3", 95);
    draft.status = TrackStatus::Draft;
    seed(&app, draft).await;

    let (status, json) = send(&app, "GET", "/api/tracks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);

    let (_, json) = send(&app, "GET", "/api/tracks?search=rain", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["tracks"][0]["title"], "Midnight Rain");
    assert_eq!(json["tracks"][0]["duration_display"], "3:20");

    let (_, json) = send(&app, "GET", "/api/tracks?status=draft", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["tracks"][0]["title"], "Sunrise");

    let (_, json) = send(&app, "GET", "/api/tracks?active_only=true", None).await;
    assert_eq!(json["count"], 1);

    let (_, json) = send(&app, "GET", "/api/tracks?uploader=someone-else", None).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_invalid_status_filter_is_bad_request() {
    let app = create_test_app(200.0).await;

    let (status, json) = send(&app, "GET", "/api/tracks?status=published", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(200.0).await;
    seed(&app, track_at("A", "1-a.mp3", 180)).await;
    seed(&app, track_at("B", "2-b.mp3", 3600)).await;

    let (status, json) = send(&app, "GET", "/api/tracks/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["active"], 2);
    assert_eq!(json["placeholder_durations"], 1);
    assert_eq!(json["total_duration_secs"], 3780);
    assert_eq!(json["total_duration_display"], "1:03:00");
}

#[tokio::test]
async fn test_get_track_not_found_and_invalid_id() {
    let app = create_test_app(200.0).await;
    let track = seed(&app, track_at("Known", "1-a.mp3", 200)).await;

    let (status, json) = send(&app, "GET", &format!("/api/tracks/{}", track.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Known");

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/tracks/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, "GET", "/api/tracks/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_track() {
    let app = create_test_app(200.0).await;
    let track = seed(&app, track_at("Before", "1-a.mp3", 200)).await;
    let uri = format!("/api/tracks/{}", track.id);

    let (status, json) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "title": "After", "status": "inactive", "genre": "Folk" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "After");
    assert_eq!(json["status"], "inactive");
    assert_eq!(json["genre"], "Folk");

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_track_removes_object() {
    let app = create_test_app(200.0).await;
    let track = seed(&app, track_at("Doomed", "1-a.mp3", 200)).await;
    let uri = format!("/api/tracks/{}", track.id);

    let (status, json) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], track.id.to_string());
    assert!(!app.objects.contains("1-a.mp3"));

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_keeps_external_urls() {
    let app = create_test_app(200.0).await;
    let track = seed(
        &app,
        track_at("Linked", "https://cdn.example.com/music/9-x.mp3", 200),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/api/tracks/{}", track.id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.objects.removed().is_empty());
}

#[tokio::test]
async fn test_correct_durations_endpoint() {
    let app = create_test_app(247.9).await;
    let placeholder = seed(&app, track_at("Placeholder", "1-a.mp3", 180)).await;
    seed(&app, track_at("Fine", "2-b.mp3", 120)).await;

    let (status, json) = send(&app, "POST", "/api/durations/correct", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scanned"], 1);
    assert_eq!(json["corrected"], 1);
    assert_eq!(json["results"][0]["outcome"], "corrected");
    assert_eq!(json["results"][0]["new_seconds"], 247);

    let stored = app.store.get_track(placeholder.id).await.unwrap().unwrap();
    assert_eq!(stored.duration_secs, 247);

    let (_, json) = send(&app, "POST", "/api/durations/correct", None).await;
    assert_eq!(json["scanned"], 0);
}

#[tokio::test]
async fn test_albums_listed_per_uploader() {
    let app = create_test_app(200.0).await;

    let (status, _) = send(&app, "GET", "/api/albums", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(
        &app,
        "POST",
        "/api/albums",
        Some(json!({ "uploader_id": "artist-1", "title": "First Light", "year": 2026 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "First Light");
    send(
        &app,
        "POST",
        "/api/albums",
        Some(json!({ "uploader_id": "artist-2", "title": "Elsewhere" })),
    )
    .await;

    let (status, json) = send(&app, "GET", "/api/albums?uploader=artist-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["albums"][0]["id"], created["id"]);
    assert_eq!(json["albums"][0]["year"], 2026);

    let (_, json) = send(&app, "GET", "/api/albums?uploader=nobody", None).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_create_album_requires_title() {
    let app = create_test_app(200.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/albums",
        Some(json!({ "uploader_id": "artist-1", "title": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}
