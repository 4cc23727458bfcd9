use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use qsearch_core::{DocId, EngineConfig, SearchEngine, SearchError, SearchHit, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upper bound on `k` accepted from clients.
const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<ResultItem>,
}

#[derive(Serialize)]
pub struct ResultItem {
    pub doc_id: DocId,
    pub id: String,
    pub score: f64,
    pub text: String,
}

impl From<SearchHit> for ResultItem {
    fn from(hit: SearchHit) -> Self {
        Self { doc_id: hit.doc_id, id: hit.external_id, score: hit.score, text: hit.text }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

type ApiError = (StatusCode, String);

fn api_error(err: SearchError) -> ApiError {
    let status = match err {
        SearchError::NotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(%status, error = %err, "search failed");
    (status, err.to_string())
}

pub fn build_app(config: &EngineConfig) -> Result<Router> {
    // The corpus is required at startup; vectorizer state loads on the first query.
    let engine = SearchEngine::open(config)?;
    tracing::info!(num_docs = engine.corpus().len(), index = %config.index_dir.display(), "opened index");
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let hits = state.engine.most_similar(&params.q, k).map_err(api_error)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: hits.len(),
        results: hits.into_iter().map(ResultItem::from).collect(),
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.engine.corpus().get(doc_id) {
        Some(entry) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "id": entry.external_id,
            "text": entry.text,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id}"))),
    }
}
