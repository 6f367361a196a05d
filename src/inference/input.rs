//! Prediction Input Module
//!
//! The accepted payload shapes, decoded from raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// == Prediction Input ==
/// A prediction payload. Variants are tried in declaration order when
/// decoding, so `[]` decodes as an empty `TextBatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionInput {
    /// A single raw text
    Text(String),
    /// Several raw texts
    TextBatch(Vec<String>),
    /// One row of numeric features, kept as sent so `1` and `1.0` stay distinct
    FeatureVector(Vec<Number>),
    /// Several rows of numeric features
    FeatureBatch(Vec<Vec<Number>>),
    /// Named fields, e.g. `{"text": "..."}` or `{"age": 31, "income": 52000}`
    FeatureRecord(Map<String, Value>),
}

impl PredictionInput {
    /// The payload as a JSON value, used for cache key derivation.
    pub fn canonical_value(&self) -> Value {
        match self {
            PredictionInput::Text(text) => Value::String(text.clone()),
            PredictionInput::TextBatch(texts) => Value::from(texts.clone()),
            PredictionInput::FeatureVector(row) => numbers_value(row),
            PredictionInput::FeatureBatch(rows) => {
                Value::Array(rows.iter().map(|row| numbers_value(row)).collect())
            }
            PredictionInput::FeatureRecord(fields) => Value::Object(fields.clone()),
        }
    }

    /// Element count of sequences and records; None for a single text.
    pub fn input_size(&self) -> Option<usize> {
        match self {
            PredictionInput::Text(_) => None,
            PredictionInput::TextBatch(texts) => Some(texts.len()),
            PredictionInput::FeatureVector(row) => Some(row.len()),
            PredictionInput::FeatureBatch(rows) => Some(rows.len()),
            PredictionInput::FeatureRecord(fields) => Some(fields.len()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictionInput::Text(_) => "text",
            PredictionInput::TextBatch(_) => "text_batch",
            PredictionInput::FeatureVector(_) => "feature_vector",
            PredictionInput::FeatureBatch(_) => "feature_batch",
            PredictionInput::FeatureRecord(_) => "feature_record",
        }
    }
}

fn numbers_value(row: &[Number]) -> Value {
    Value::Array(row.iter().cloned().map(Value::Number).collect())
}

impl From<&str> for PredictionInput {
    fn from(text: &str) -> Self {
        PredictionInput::Text(text.to_string())
    }
}
