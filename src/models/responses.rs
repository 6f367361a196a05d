//! Response DTOs for the prediction API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::time::Duration;

use serde::Serialize;

use crate::inference::{ModelInfo, PredictionModelInfo, PredictionResult};
use crate::prediction::{CacheEntryMetadata, ServiceStats};

/// Per-request details attached to a prediction response.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionMetadata {
    pub input_size: Option<usize>,
    /// Whether a fresh result was written to the cache
    pub cached: Option<bool>,
}

/// Response body for `POST /predict`
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_probabilities: Option<Vec<Vec<f64>>>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    pub processing_time_seconds: f64,
    pub model_info: PredictionModelInfo,
    pub metadata: PredictionMetadata,
}

impl PredictionResponse {
    pub fn new(result: PredictionResult, elapsed: Duration) -> Self {
        Self {
            success: true,
            prediction: result.prediction,
            confidence: result.confidence,
            prediction_probabilities: result.prediction_probabilities,
            from_cache: result.from_cache,
            cache_key: result.cache_key,
            processing_time_seconds: elapsed.as_secs_f64(),
            model_info: result.model_info,
            metadata: PredictionMetadata {
                input_size: result.input_size,
                cached: result.cached,
            },
        }
    }
}

/// Response body for `GET /model/info`
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfoResponse {
    pub success: bool,
    pub model_info: ModelInfo,
}

impl ModelInfoResponse {
    pub fn new(model_info: ModelInfo) -> Self {
        Self {
            success: true,
            model_info,
        }
    }
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: ServiceStats,
    pub timestamp: String,
}

impl CacheStatsResponse {
    pub fn new(stats: ServiceStats) -> Self {
        Self {
            success: true,
            stats,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /cache/info`
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub metadata: CacheEntryMetadata,
}

impl CacheInfoResponse {
    pub fn new(metadata: CacheEntryMetadata) -> Self {
        Self {
            success: true,
            metadata,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub success: bool,
    pub message: String,
}

impl FlushResponse {
    pub fn new(flushed: bool) -> Self {
        let message = if flushed {
            "Cache cleared successfully"
        } else {
            "Failed to clear cache"
        };
        Self {
            success: flushed,
            message: message.to_string(),
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub version: String,
    /// Seconds since the server started
    pub up_time: f64,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(version: impl Into<String>, up_time: Duration) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: version.into(),
            up_time: up_time.as_secs_f64(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
