//! Axum server and routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use kg_cache::CacheStats;
use kg_retrieval::{RetrievalError, RetrievalRequest, RetrievalResult, Retriever};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

/// Response envelope: `code` mirrors an HTTP status, `data` is absent on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub removed: usize,
}

pub struct AppState {
    pub retriever: Arc<Retriever>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/retrieve", post(handle_retrieve))
        .route("/cache/stats", get(handle_cache_stats))
        .route("/cache/clear", post(handle_cache_clear))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Envelope code for a failed retrieval.
pub fn error_code(err: &RetrievalError) -> i32 {
    match err {
        RetrievalError::InvalidParameter(_) => 400,
        RetrievalError::GraphUnavailable(_) => 503,
    }
}

async fn handle_retrieve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrievalRequest>,
) -> Json<ApiResponse<RetrievalResult>> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("retrieve", request_id = %request_id);
    match state.retriever.retrieve(&req).instrument(span).await {
        Ok(result) => Json(ApiResponse::ok(result)),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "retrieve failed");
            Json(ApiResponse::error(error_code(&e), e.to_string()))
        }
    }
}

async fn handle_cache_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    let Some(cache) = state.retriever.cache() else {
        return Json(ApiResponse::error(404, "cache disabled"));
    };
    match cache.stats().await {
        Ok(stats) => Json(ApiResponse::ok(stats)),
        Err(e) => Json(ApiResponse::error(500, e.to_string())),
    }
}

async fn handle_cache_clear(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ClearResponse>> {
    let Some(cache) = state.retriever.cache() else {
        return Json(ApiResponse::error(404, "cache disabled"));
    };
    match cache.clear().await {
        Ok(removed) => Json(ApiResponse::ok(ClearResponse { removed })),
        Err(e) => Json(ApiResponse::error(500, e.to_string())),
    }
}

async fn handle_health() -> &'static str {
    "ok"
}
