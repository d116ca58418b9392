//! Router-level tests driven through `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pomb_backend::config::ServerConfig;
use pomb_backend::db::repositories::LocalRepository;
use pomb_backend::db::repository::CoordRepository;
use pomb_backend::http::{create_router, AppState};

const BOUNDARY: &str = "pomb-test-boundary";

fn app(repo: &LocalRepository, temp_dir: &Path, max_upload_files: usize) -> Router {
    let config = ServerConfig {
        temp_dir: temp_dir.to_path_buf(),
        max_upload_files,
        ..Default::default()
    };
    let repo = Arc::new(repo.clone()) as Arc<dyn CoordRepository>;
    create_router(AppState::from_config(repo, config))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn multipart_request(uri: &str, field: &str, files: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(support::multipart_body(BOUNDARY, field, files)))
        .unwrap()
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Wait for the detached cleanup task to empty `dir`.
async fn wait_until_empty(dir: &Path) -> usize {
    for _ in 0..50 {
        if support::file_count(dir) == 0 {
            return 0;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    support::file_count(dir)
}

fn feature(coords: Value, times: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": { "coordTimes": times },
        "geometry": { "type": "LineString", "coordinates": coords }
    })
}

#[tokio::test]
async fn test_health_reports_database_status() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let (status, body) = send(app(&repo, dir.path(), 5), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    repo.set_healthy(false);
    let (_, body) = send(app(&repo, dir.path(), 5), get("/health")).await;
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_process_gpx_returns_merged_feature_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let later = support::gpx_doc(&[(10, 0.0, 0.0), (20, 1.0, 1.0)]);
    let earlier = support::gpx_doc(&[(0, 2.0, 2.0), (30, 3.0, 3.0)]);

    let (status, body) = send(
        app(&repo, dir.path(), 5),
        multipart_request(
            "/api/process-gpx",
            "uploads[]",
            &[("a.gpx", &later), ("b.gpx", &earlier)],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let geo = &body["data"]["geoJSON"];
    assert_eq!(geo["type"], "Feature");
    assert_eq!(geo["geometry"]["type"], "LineString");
    // Four points decimate to the first one, which comes from b.gpx.
    assert_eq!(geo["geometry"]["coordinates"], json!([[2.0, 2.0, 100.0]]));
    assert_eq!(
        geo["properties"]["coordTimes"],
        json!([support::time_at(0)])
    );
    assert_eq!(wait_until_empty(dir.path()).await, 0);
    assert_eq!(repo.coord_count(), 0);
}

#[tokio::test]
async fn test_process_gpx_without_files_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let (status, body) = send(
        app(&repo, dir.path(), 5),
        multipart_request("/api/process-gpx", "uploads[]", &[]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_process_gpx_over_limit_is_rejected_and_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let doc = support::gpx_run(0, 2);

    let (status, body) = send(
        app(&repo, dir.path(), 2),
        multipart_request(
            "/api/process-gpx",
            "uploads[]",
            &[("1.gpx", &doc), ("2.gpx", &doc), ("3.gpx", &doc)],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(wait_until_empty(dir.path()).await, 0);
}

#[tokio::test]
async fn test_process_gpx_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let (status, body) = send(
        app(&repo, dir.path(), 5),
        multipart_request(
            "/api/process-gpx",
            "uploads[]",
            &[("broken.gpx", "<gpx><trk><trkseg><trkpt lat=")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PARSE_ERROR");
    assert_eq!(body["details"], "file=broken.gpx");
    assert_eq!(wait_until_empty(dir.path()).await, 0);
}

#[tokio::test]
async fn test_process_gpx_rejects_unexpected_field() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let doc = support::gpx_run(0, 2);

    let (status, body) = send(
        app(&repo, dir.path(), 5),
        multipart_request("/api/process-gpx", "file", &[("a.gpx", &doc)]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let body = feature(
        json!([[7.9, 46.5, 1200.5], [8.0, 46.6]]),
        json!(["2017-08-01T08:00:00Z", "2017-08-01T08:00:10Z"]),
    );

    let (status, response) = send(
        app(&repo, dir.path(), 5),
        json_request("/api/process-gpx/upload?juncture=7", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["response"], "Uploaded 2 coord pairs to server");

    let (status, coords) = send(app(&repo, dir.path(), 5), get("/api/junctures/7/coords")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(coords["total"], 2);
    assert_eq!(coords["coords"][0]["lat"], 46.5);
    assert_eq!(coords["coords"][0]["lon"], 7.9);
    assert_eq!(coords["coords"][1]["elevation"], Value::Null);
}

#[tokio::test]
async fn test_upload_replaces_previous_rows() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let first = feature(
        json!([[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]),
        json!([support::time_at(0), support::time_at(1), support::time_at(2)]),
    );
    let second = feature(json!([[4.0, 4.0]]), json!([support::time_at(9)]));

    for body in [&first, &second] {
        let (status, _) = send(
            app(&repo, dir.path(), 5),
            json_request("/api/process-gpx/upload?juncture=7", body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let stored = repo
        .fetch_coords(pomb_backend::tracks::JunctureId(7))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].lat, 4.0);
}

#[tokio::test]
async fn test_upload_length_mismatch_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let body = feature(json!([[1.0, 1.0], [2.0, 2.0]]), json!([support::time_at(0)]));

    let (status, response) = send(
        app(&repo, dir.path(), 5),
        json_request("/api/process-gpx/upload?juncture=3", &body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
    assert_eq!(repo.coord_count(), 0);
}

#[tokio::test]
async fn test_upload_repository_failure_is_reported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    let body = feature(json!([[1.0, 95.0]]), json!([support::time_at(0)]));

    let (status, response) = send(
        app(&repo, dir.path(), 5),
        json_request("/api/process-gpx/upload?juncture=3", &body),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["code"], "REPOSITORY_ERROR");
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("coords_lat_range"));
}

#[tokio::test]
async fn test_unknown_juncture_has_no_coords() {
    let dir = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let (status, body) = send(app(&repo, dir.path(), 5), get("/api/junctures/99/coords")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["coords"], json!([]));
}
