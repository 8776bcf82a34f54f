use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use searchcore::{IndexConfig, IndexPaths, IndexWriter};
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let mut writer = IndexWriter::create(IndexPaths::new(dir), IndexConfig::default()).unwrap();
    writer.add_document("doc-a", "Rust is great. Rust systems programming with rust.").unwrap();
    writer.add_document("doc-b", "Learning rust slowly, one chapter a week, between other hobbies.").unwrap();
    writer.add_document("doc-c", "Gardening tips for spring").unwrap();
    writer.finish().unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn app(dir: &std::path::Path) -> Router {
    server::build_app(dir.to_string_lossy().to_string()).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app(dir.path()), "/search?q=rust&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["query"], "rust");
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"].as_u64().unwrap(), 1);
    assert_eq!(arr[0]["doc_no"], "doc-a");
    assert_eq!(arr[1]["doc_no"], "doc-b");
    assert!(arr[0]["score"].as_f64().unwrap() > arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn search_modes_and_parameters() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app(dir.path()), "/search?q=rust%20gardening&mode=conjunctive").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["results"].as_array().unwrap().is_empty());

    let (status, body) = call(app(dir.path()), "/search?q=rust%20gardening&scoring=tfidf&k=500").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 3);

    let (status, _) = call(app(dir.path()), "/search?q=rust&scoring=cosine").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(app(dir.path()), "/search?q=the").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, body) = call(app(dir.path()), "/doc/3").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["doc_no"], "doc-c");
    assert_eq!(json["doc_len"], 3);

    let (status, _) = call(app(dir.path()), "/doc/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(app(dir.path()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}
