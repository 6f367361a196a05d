//! API Routes
//!
//! Configures the Axum router with all prediction service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_info_handler, cache_stats_handler, flush_cache_handler, health_handler,
    model_info_handler, predict_handler, AppState,
};

/// Creates the main router with every endpoint mounted under `api_prefix`.
///
/// # Endpoints
/// - `POST /predict` - Predict, reading through the cache
/// - `GET /model/info` - Loaded model metadata
/// - `GET /cache/stats` - Cache and model health
/// - `GET /cache/info` - Metadata of one cached prediction
/// - `DELETE /cache` - Flush the cache
/// - `GET /health` - Liveness
pub fn create_router(state: AppState, api_prefix: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/predict", post(predict_handler))
        .route("/model/info", get(model_info_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/info", get(cache_info_handler))
        .route("/cache", delete(flush_cache_handler))
        .route("/health", get(health_handler));

    // axum panics on a nest path that is empty or lacks the leading slash
    let prefix = api_prefix.trim_matches('/');
    let router = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", prefix), api)
    };

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
