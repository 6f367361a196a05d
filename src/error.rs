//! Error types for the prediction service
//!
//! Provides unified error handling using thiserror. Only startup failures and
//! prediction failures are represented here; cache backend failures never
//! leave the cache client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::inference::InferenceError;
use crate::models::ErrorResponse;

// == Service Error Enum ==
/// Unified error type for the prediction service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The cache store could not be reached at startup
    #[error("Cache service unavailable: {0}")]
    CacheUnavailable(String),

    /// A required model artifact does not exist
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// A model artifact exists but could not be deserialized
    #[error("Failed to load ML model: {0}")]
    ModelLoad(String),

    /// Feature transformation or inference failed
    #[error("Prediction failed: {0}")]
    PredictionFailed(#[from] InferenceError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Whether the service must refuse to start on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::CacheUnavailable(_)
                | ServiceError::ModelNotFound(_)
                | ServiceError::ModelLoad(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::ModelNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ModelLoad(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::PredictionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the prediction service.
pub type Result<T> = std::result::Result<T, ServiceError>;
