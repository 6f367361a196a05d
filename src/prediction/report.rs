//! Report types returned by the prediction service.

use serde::Serialize;

use crate::cache::{CacheHealth, KeyTtl};
use crate::inference::{ModelHealth, PredictionResult};

pub const NOT_FOUND_MESSAGE: &str = "Prediction not found in cache";

// == Cache Entry Metadata ==
/// Read-only view over one stored prediction.
///
/// Only the label and confidence are echoed back, never the full
/// probability vectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryMetadata {
    pub exists: bool,
    pub cache_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining lifetime; absent when the key has no expiry or the store
    /// could not report it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_probabilities: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_summary: Option<PredictionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub prediction: Vec<String>,
    pub confidence: Option<f64>,
}

impl CacheEntryMetadata {
    pub fn not_found(cache_key: impl Into<String>) -> Self {
        Self {
            exists: false,
            cache_key: cache_key.into(),
            message: Some(NOT_FOUND_MESSAGE.to_string()),
            ttl_seconds: None,
            prediction_timestamp: None,
            model_type: None,
            has_probabilities: None,
            prediction_summary: None,
        }
    }

    pub fn found(cache_key: impl Into<String>, stored: &PredictionResult, ttl: KeyTtl) -> Self {
        Self {
            exists: true,
            cache_key: cache_key.into(),
            message: None,
            ttl_seconds: ttl.as_secs(),
            prediction_timestamp: Some(stored.model_info.prediction_timestamp.clone()),
            model_type: Some(stored.model_info.model_type.clone()),
            has_probabilities: Some(stored.has_probabilities()),
            prediction_summary: Some(PredictionSummary {
                prediction: stored.prediction.clone(),
                confidence: stored.confidence,
            }),
        }
    }
}

// == Service Stats ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

/// Combined health of the cache and the model.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub service_status: ServiceStatus,
    pub cache_status: CacheHealth,
    pub model_status: ModelHealth,
}

impl ServiceStats {
    /// Healthy only when both parts are healthy.
    pub fn aggregate(cache_status: CacheHealth, model_status: ModelHealth) -> Self {
        let service_status = if cache_status.is_healthy() && model_status.is_healthy() {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        };

        Self {
            service_status,
            cache_status,
            model_status,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ServerInfo;
    use crate::inference::{ModelInfo, PredictionModelInfo};
    use serde_json::json;
    use std::time::Duration;

    fn healthy_cache() -> CacheHealth {
        CacheHealth::Healthy {
            backend: "memory".into(),
            server: ServerInfo::default(),
            hit_rate: 0.0,
        }
    }

    fn healthy_model() -> ModelHealth {
        ModelHealth::Healthy {
            model_info: ModelInfo {
                model_type: "LogisticRegression".into(),
                model_path: None,
                vectorizer_path: None,
                n_features: 2,
                classes: vec!["negative".into(), "positive".into()],
                loaded_at: "2026-01-01T00:00:00+00:00".into(),
            },
        }
    }

    #[test]
    fn test_aggregate_all_combinations() {
        let down_cache = || CacheHealth::Unhealthy {
            backend: "redis".into(),
            error: "connection refused".into(),
        };
        let down_model = || ModelHealth::Unhealthy {
            error: "Model not loaded".into(),
        };

        let cases = [
            (healthy_cache(), healthy_model(), ServiceStatus::Healthy),
            (down_cache(), healthy_model(), ServiceStatus::Degraded),
            (healthy_cache(), down_model(), ServiceStatus::Degraded),
            (down_cache(), down_model(), ServiceStatus::Degraded),
        ];
        for (cache, model, expected) in cases {
            assert_eq!(ServiceStats::aggregate(cache, model).service_status, expected);
        }
    }

    #[test]
    fn test_stats_serialization() {
        let stats = ServiceStats::aggregate(healthy_cache(), healthy_model());
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["service_status"], "healthy");
        assert_eq!(value["cache_status"]["status"], "healthy");
        assert_eq!(value["model_status"]["status"], "healthy");
        assert_eq!(value["model_status"]["model_info"]["n_features"], 2);
    }

    #[test]
    fn test_not_found_metadata() {
        let value = serde_json::to_value(CacheEntryMetadata::not_found("ml_pred:unknown")).unwrap();
        assert_eq!(
            value,
            json!({
                "exists": false,
                "cache_key": "ml_pred:unknown",
                "message": "Prediction not found in cache"
            })
        );
    }

    #[test]
    fn test_found_metadata_summarizes() {
        let stored = PredictionResult::new(
            vec!["positive".into()],
            Some(vec![vec![0.1, 0.9]]),
            PredictionModelInfo {
                model_type: "LogisticRegression".into(),
                prediction_timestamp: "2026-01-01T00:00:00+00:00".into(),
            },
        );

        let meta = CacheEntryMetadata::found("k", &stored, KeyTtl::Expires(Duration::from_secs(42)));
        assert!(meta.exists);
        assert_eq!(meta.ttl_seconds, Some(42));
        assert_eq!(meta.has_probabilities, Some(true));

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["prediction_summary"], json!({"prediction": ["positive"], "confidence": 0.9}));
        assert!(value.get("prediction_probabilities").is_none());
        assert!(value.get("message").is_none());
    }
}
