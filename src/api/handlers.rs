//! API Handlers
//!
//! HTTP request handlers for each prediction service endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::inference::PredictionInput;
use crate::models::{
    CacheInfoQuery, CacheInfoResponse, CacheStatsResponse, FlushResponse, HealthResponse,
    ModelInfoResponse, PredictQuery, PredictionResponse,
};
use crate::prediction::PredictionService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub started_at: Instant,
    pub version: String,
}

impl AppState {
    pub fn new(service: PredictionService, version: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Instant::now(),
            version: version.into(),
        }
    }

    /// Loads the model and connects the cache described by `config`.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let service = PredictionService::initialize(config).await?;
        Ok(Self::new(service, config.app_version.clone()))
    }

    /// Releases the model and closes the cache client.
    pub fn shutdown(&self) {
        self.service.shutdown();
    }
}

/// Handler for POST /predict
///
/// The body is the raw input: a text, a list of texts, a feature vector,
/// a batch of vectors or a record.
pub async fn predict_handler(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
    Json(input): Json<PredictionInput>,
) -> Result<Json<PredictionResponse>> {
    let started = Instant::now();
    let result = state.service.predict_single(&input, query.use_cache).await?;

    info!(
        kind = input.kind(),
        from_cache = result.from_cache,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Prediction served"
    );

    Ok(Json(PredictionResponse::new(result, started.elapsed())))
}

/// Handler for GET /model/info
pub async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    Json(ModelInfoResponse::new(state.service.model_info()))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse::new(state.service.cache_stats().await))
}

/// Handler for GET /cache/info?cache_key=...
pub async fn cache_info_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheInfoQuery>,
) -> Result<Json<CacheInfoResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let metadata = state.service.prediction_info(&query.cache_key).await;
    Ok(Json(CacheInfoResponse::new(metadata)))
}

/// Handler for DELETE /cache
pub async fn flush_cache_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    Json(FlushResponse::new(state.service.flush_cache().await))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.version.clone(),
        state.started_at.elapsed(),
    ))
}
