use anyhow::{Context, Result};
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use searchcore::{IndexPaths, QueryMode, Scoring, SearchHit, SearchOptions, Searcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// `bm25` or `tfidf`; the index's own scoring when absent.
    pub scoring: Option<String>,
    /// `disjunctive` (default) or `conjunctive`.
    pub mode: Option<String>,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: u32,
    pub doc_no: String,
    pub doc_len: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher>,
}

type ApiError = (StatusCode, String);

pub fn build_app(index_dir: String) -> Result<Router> {
    let searcher = Searcher::open(IndexPaths::new(&index_dir)).with_context(|| format!("opening index {index_dir}"))?;
    let app_state = AppState { searcher: Arc::new(searcher) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let scoring = params
        .scoring
        .as_deref()
        .map(str::parse::<Scoring>)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let mode = params
        .mode
        .as_deref()
        .map(str::parse::<QueryMode>)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?
        .unwrap_or_default();
    let opts = SearchOptions { scoring, mode, k: params.k.clamp(1, MAX_K) };

    let results = state.searcher.search(&params.q, &opts).map_err(|e| {
        tracing::error!(error = %e, query = %params.q, "search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<DocResponse>, ApiError> {
    match state.searcher.doc_index().get(doc_id) {
        Some(info) => Ok(Json(DocResponse { doc_id, doc_no: info.doc_no.clone(), doc_len: info.doc_len })),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id}"))),
    }
}
