//! Prediction Result Module

use serde::{Deserialize, Serialize};

use crate::cache::Storable;

/// Model metadata attached to every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionModelInfo {
    pub model_type: String,
    /// ISO-8601 time the prediction was computed
    pub prediction_timestamp: String,
}

// == Prediction Result ==
/// A prediction as produced by the model and enriched by the orchestrator.
///
/// Every field is always serialized, so the opaque (bincode) cache encoding
/// stays positional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// One label per input row
    pub prediction: Vec<String>,
    /// Highest class probability of the first row
    pub confidence: Option<f64>,
    /// Per-class probabilities per row
    pub prediction_probabilities: Option<Vec<Vec<f64>>>,
    pub model_info: PredictionModelInfo,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub input_size: Option<usize>,
    /// Whether the store acknowledged the write of this result
    #[serde(default)]
    pub cached: Option<bool>,
}

impl PredictionResult {
    /// Builds a fresh result straight from model output.
    pub fn new(
        prediction: Vec<String>,
        prediction_probabilities: Option<Vec<Vec<f64>>>,
        model_info: PredictionModelInfo,
    ) -> Self {
        let confidence = prediction_probabilities
            .as_ref()
            .and_then(|rows| rows.first())
            .and_then(|row| row.iter().copied().reduce(f64::max));

        Self {
            prediction,
            confidence,
            prediction_probabilities,
            model_info,
            from_cache: false,
            cache_key: None,
            input_size: None,
            cached: None,
        }
    }

    pub fn has_probabilities(&self) -> bool {
        self.prediction_probabilities.is_some()
    }
}

impl Storable for PredictionResult {
    fn json_safe(&self) -> bool {
        let confidence_ok = self.confidence.map_or(true, f64::is_finite);
        let probabilities_ok = self
            .prediction_probabilities
            .iter()
            .flatten()
            .flatten()
            .all(|p| p.is_finite());
        confidence_ok && probabilities_ok
    }
}
