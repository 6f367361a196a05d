//! Inference Adapter Module
//!
//! Owns the loaded model and vectorizer for the life of the process and turns
//! tagged inputs into prediction results.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::{debug, error, info, warn};

use crate::error::{Result, ServiceError};
use crate::inference::text::clean_text;
use crate::inference::{
    Classifier, InferenceError, LinearModel, PredictionInput, PredictionModelInfo,
    PredictionResult, TfidfVectorizer,
};

/// Record field read when a record is sent to a text model.
const TEXT_FIELD: &str = "text";

// == Model Info ==
/// Static metadata captured at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub model_path: Option<String>,
    pub vectorizer_path: Option<String>,
    pub n_features: usize,
    pub classes: Vec<String>,
    /// ISO-8601 load time
    pub loaded_at: String,
}

// == Model Health ==
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModelHealth {
    Healthy { model_info: ModelInfo },
    Unhealthy { error: String },
}

impl ModelHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ModelHealth::Healthy { .. })
    }
}

#[derive(Debug)]
struct LoadedModel {
    classifier: Arc<dyn Classifier>,
    vectorizer: Option<TfidfVectorizer>,
}

// == Inference Adapter ==
#[derive(Debug)]
pub struct InferenceAdapter {
    model: RwLock<Option<Arc<LoadedModel>>>,
    info: ModelInfo,
}

impl InferenceAdapter {
    // == Load ==
    /// Loads the model artifact and, when given, the vectorizer artifact.
    ///
    /// A missing file yields `ModelNotFound`; an unreadable or inconsistent
    /// artifact yields `ModelLoad`. Either one must stop the service.
    pub fn load(model_path: &Path, vectorizer_path: Option<&Path>) -> Result<Self> {
        let model: LinearModel = read_artifact(model_path)?;
        model
            .validate()
            .map_err(|e| ServiceError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let vectorizer = match vectorizer_path {
            Some(path) => {
                let vectorizer: TfidfVectorizer = read_artifact(path)?;
                vectorizer
                    .validate()
                    .map_err(|e| ServiceError::ModelLoad(format!("{}: {}", path.display(), e)))?;
                Some(vectorizer)
            }
            None => None,
        };

        let mut adapter = Self::from_parts(Arc::new(model), vectorizer)?;
        adapter.info.model_path = Some(model_path.display().to_string());
        adapter.info.vectorizer_path = vectorizer_path.map(|p| p.display().to_string());

        info!(
            model_type = %adapter.info.model_type,
            n_features = adapter.info.n_features,
            vectorizer = adapter.info.vectorizer_path.is_some(),
            "Successfully loaded model"
        );

        Ok(adapter)
    }

    /// Builds an adapter around an in-memory classifier.
    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        vectorizer: Option<TfidfVectorizer>,
    ) -> Result<Self> {
        if let Some(vz) = &vectorizer {
            if vz.n_features() != classifier.n_features() {
                return Err(ServiceError::ModelLoad(format!(
                    "vectorizer produces {} features, model expects {}",
                    vz.n_features(),
                    classifier.n_features()
                )));
            }
        }

        let info = ModelInfo {
            model_type: classifier.model_type().to_string(),
            model_path: None,
            vectorizer_path: None,
            n_features: classifier.n_features(),
            classes: classifier.classes().to_vec(),
            loaded_at: Utc::now().to_rfc3339(),
        };

        Ok(Self {
            model: RwLock::new(Some(Arc::new(LoadedModel {
                classifier,
                vectorizer,
            }))),
            info,
        })
    }

    // == Predict ==
    /// Predicts for a single item or a batch.
    ///
    /// Probabilities are attached when the model provides them; a failure of
    /// the probability call alone is logged and leaves them out.
    pub fn predict(&self, input: &PredictionInput) -> std::result::Result<PredictionResult, InferenceError> {
        let loaded = self.current().ok_or(InferenceError::NotLoaded)?;

        let rows = features(&loaded, input)?;
        let prediction = loaded.classifier.predict(&rows)?;

        let probabilities = if loaded.classifier.has_proba() {
            match loaded.classifier.predict_proba(&rows) {
                Ok(proba) => Some(proba),
                Err(e) => {
                    warn!(error = %e, "Could not get prediction probabilities");
                    None
                }
            }
        } else {
            None
        };

        let result = PredictionResult::new(
            prediction,
            probabilities,
            PredictionModelInfo {
                model_type: self.info.model_type.clone(),
                prediction_timestamp: Utc::now().to_rfc3339(),
            },
        );
        debug!(kind = input.kind(), rows = rows.len(), prediction = ?result.prediction, "Made prediction");

        Ok(result)
    }

    // == Describe ==
    pub fn describe(&self) -> ModelInfo {
        self.info.clone()
    }

    // == Health Check ==
    /// Runs a dummy all-zero prediction to confirm the model is callable.
    pub fn health_check(&self) -> ModelHealth {
        let Some(loaded) = self.current() else {
            return ModelHealth::Unhealthy {
                error: "Model not loaded".to_string(),
            };
        };

        let dummy = vec![vec![0.0; loaded.classifier.n_features()]];
        match loaded.classifier.predict(&dummy) {
            Ok(_) => ModelHealth::Healthy {
                model_info: self.describe(),
            },
            Err(e) => {
                warn!(error = %e, "Model health check failed");
                ModelHealth::Unhealthy {
                    error: e.to_string(),
                }
            }
        }
    }

    // == Unload ==
    /// Releases the model. Later predictions fail with `NotLoaded`.
    pub fn unload(&self) {
        match self.model.write() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    info!(model_type = %self.info.model_type, "Model unloaded");
                }
            }
            Err(_) => error!("Model lock poisoned during unload"),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<LoadedModel>> {
        self.model.read().ok().and_then(|guard| guard.clone())
    }
}

/// Maps an input onto model rows, validating their width.
fn features(
    loaded: &LoadedModel,
    input: &PredictionInput,
) -> std::result::Result<Vec<Vec<f64>>, InferenceError> {
    let rows = match input {
        PredictionInput::Text(text) => vec![vectorize(loaded, text)?],
        PredictionInput::TextBatch(texts) => {
            if texts.is_empty() {
                return Err(InferenceError::EmptyInput);
            }
            texts
                .iter()
                .map(|text| vectorize(loaded, text))
                .collect::<std::result::Result<_, _>>()?
        }
        PredictionInput::FeatureVector(row) => vec![numeric_row(row)?],
        PredictionInput::FeatureBatch(rows) => {
            if rows.is_empty() {
                return Err(InferenceError::EmptyInput);
            }
            rows.iter()
                .map(|row| numeric_row(row))
                .collect::<std::result::Result<_, _>>()?
        }
        PredictionInput::FeatureRecord(fields) => vec![record_row(loaded, fields)?],
    };

    let expected = loaded.classifier.n_features();
    if let Some(row) = rows.iter().find(|row| row.len() != expected) {
        return Err(InferenceError::FeatureMismatch {
            expected,
            actual: row.len(),
        });
    }

    Ok(rows)
}

fn numeric_row(row: &[Number]) -> std::result::Result<Vec<f64>, InferenceError> {
    row.iter()
        .map(|n| {
            n.as_f64().ok_or_else(|| {
                InferenceError::UnsupportedInput(format!("feature {} is not representable as f64", n))
            })
        })
        .collect()
}

fn vectorize(loaded: &LoadedModel, text: &str) -> std::result::Result<Vec<f64>, InferenceError> {
    let vectorizer = loaded
        .vectorizer
        .as_ref()
        .ok_or(InferenceError::MissingVectorizer)?;
    Ok(vectorizer.transform(&clean_text(text)))
}

/// A record feeds its `text` field to a text model, or its named features
/// to a record-trained model.
fn record_row(
    loaded: &LoadedModel,
    fields: &Map<String, Value>,
) -> std::result::Result<Vec<f64>, InferenceError> {
    if loaded.vectorizer.is_some() {
        let text = fields
            .get(TEXT_FIELD)
            .ok_or_else(|| InferenceError::MissingField(TEXT_FIELD.to_string()))?
            .as_str()
            .ok_or_else(|| InferenceError::InvalidField(TEXT_FIELD.to_string()))?;
        return vectorize(loaded, text);
    }

    let names = loaded.classifier.feature_names().ok_or_else(|| {
        InferenceError::UnsupportedInput("model was not trained on named features".to_string())
    })?;

    names
        .iter()
        .map(|name| {
            fields
                .get(name)
                .ok_or_else(|| InferenceError::MissingField(name.clone()))?
                .as_f64()
                .ok_or_else(|| InferenceError::InvalidField(name.clone()))
        })
        .collect()
}

/// Reads and deserializes one JSON artifact.
fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        error!(path = %path.display(), "Model artifact not found");
        return Err(ServiceError::ModelNotFound(path.display().to_string()));
    }

    let raw = fs::read(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to read model artifact");
        ServiceError::ModelLoad(format!("{}: {}", path.display(), e))
    })?;

    serde_json::from_slice(&raw).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to deserialize model artifact");
        ServiceError::ModelLoad(format!("{}: {}", path.display(), e))
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sentiment_adapter() -> InferenceAdapter {
        let vocabulary: HashMap<String, usize> = [("great", 0), ("terrible", 1)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        let model = LinearModel::new(labels(&["negative", "positive"]), vec![vec![4.0, -4.0]], vec![0.0]);
        InferenceAdapter::from_parts(Arc::new(model), Some(TfidfVectorizer::new(vocabulary, None))).unwrap()
    }

    fn record_adapter() -> InferenceAdapter {
        let model = LinearModel::new(labels(&["low", "high"]), vec![vec![1.0, 1.0]], vec![-10.0])
            .with_feature_names(labels(&["age", "score"]));
        InferenceAdapter::from_parts(Arc::new(model), None).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("microml-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_predict_text() {
        let adapter = sentiment_adapter();
        let result = adapter.predict(&PredictionInput::from("A GREAT product!")).unwrap();

        assert_eq!(result.prediction, labels(&["positive"]));
        let confidence = result.confidence.unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0);
        assert_eq!(result.model_info.model_type, "LogisticRegression");
        assert!(!result.from_cache);
        assert!(result.cache_key.is_none());
    }

    #[test]
    fn test_predict_text_batch_and_record() {
        let adapter = sentiment_adapter();

        let batch = PredictionInput::TextBatch(labels(&["great", "terrible"]));
        let result = adapter.predict(&batch).unwrap();
        assert_eq!(result.prediction, labels(&["positive", "negative"]));
        assert_eq!(result.prediction_probabilities.unwrap().len(), 2);

        let record: PredictionInput = serde_json::from_value(json!({"text": "terrible"})).unwrap();
        assert_eq!(adapter.predict(&record).unwrap().prediction, labels(&["negative"]));
    }

    #[test]
    fn test_predict_named_features() {
        let adapter = record_adapter();
        let input: PredictionInput = serde_json::from_value(json!({"score": 8, "age": 5})).unwrap();
        assert_eq!(adapter.predict(&input).unwrap().prediction, labels(&["high"]));

        let missing: PredictionInput = serde_json::from_value(json!({"age": 5})).unwrap();
        assert_eq!(
            adapter.predict(&missing).unwrap_err(),
            InferenceError::MissingField("score".into())
        );

        let wrong: PredictionInput = serde_json::from_value(json!({"age": "old", "score": 1})).unwrap();
        assert_eq!(adapter.predict(&wrong).unwrap_err(), InferenceError::InvalidField("age".into()));
    }

    #[test]
    fn test_integer_and_float_rows_predict_alike() {
        let adapter = record_adapter();
        let ints: PredictionInput = serde_json::from_str("[3, 9]").unwrap();
        let floats: PredictionInput = serde_json::from_str("[3.0, 9.0]").unwrap();

        let from_ints = adapter.predict(&ints).unwrap();
        assert_eq!(from_ints.prediction, labels(&["high"]));
        assert_eq!(
            from_ints.prediction_probabilities,
            adapter.predict(&floats).unwrap().prediction_probabilities
        );

        let batch: PredictionInput = serde_json::from_str("[[1, 2], [6.5, 7]]").unwrap();
        assert_eq!(adapter.predict(&batch).unwrap().prediction, labels(&["low", "high"]));
    }

    #[test]
    fn test_input_errors() {
        let text_model = sentiment_adapter();
        assert_eq!(
            text_model.predict(&serde_json::from_value(json!([1.0])).unwrap()).unwrap_err(),
            InferenceError::FeatureMismatch { expected: 2, actual: 1 }
        );
        assert_eq!(
            text_model.predict(&PredictionInput::TextBatch(vec![])).unwrap_err(),
            InferenceError::EmptyInput
        );

        let feature_model = record_adapter();
        assert_eq!(
            feature_model.predict(&PredictionInput::from("great")).unwrap_err(),
            InferenceError::MissingVectorizer
        );
    }

    #[test]
    fn test_health_and_unload() {
        let adapter = sentiment_adapter();
        assert!(adapter.health_check().is_healthy());

        adapter.unload();

        assert!(!adapter.is_loaded());
        match adapter.health_check() {
            ModelHealth::Unhealthy { error } => assert_eq!(error, "Model not loaded"),
            ModelHealth::Healthy { .. } => panic!("unloaded model reported healthy"),
        }
        assert_eq!(
            adapter.predict(&PredictionInput::from("great")).unwrap_err(),
            InferenceError::NotLoaded
        );
    }

    #[test]
    fn test_load_missing_artifact() {
        let err = InferenceAdapter::load(&temp_path("does-not-exist.json"), None).unwrap_err();
        assert!(matches!(err, ServiceError::ModelNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_corrupt_artifact() {
        let path = temp_path("corrupt-model.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = InferenceAdapter::load(&path, None).unwrap_err();
        assert!(matches!(err, ServiceError::ModelLoad(_)));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_artifacts_from_disk() {
        let model_path = temp_path("model.json");
        let vectorizer_path = temp_path("vectorizer.json");
        fs::write(
            &model_path,
            r#"{"classes": ["negative", "positive"], "coef": [[1.5, -1.5]], "intercept": [0.0]}"#,
        )
        .unwrap();
        fs::write(&vectorizer_path, r#"{"vocabulary": {"good": 0, "bad": 1}}"#).unwrap();

        let adapter = InferenceAdapter::load(&model_path, Some(&vectorizer_path)).unwrap();
        let info = adapter.describe();
        assert_eq!(info.n_features, 2);
        assert_eq!(info.classes, labels(&["negative", "positive"]));
        assert_eq!(info.model_path, Some(model_path.display().to_string()));
        assert_eq!(
            adapter.predict(&PredictionInput::from("good")).unwrap().prediction,
            labels(&["positive"])
        );

        fs::remove_file(&model_path).ok();
        fs::remove_file(&vectorizer_path).ok();
    }

    #[test]
    fn test_vectorizer_width_must_match_model() {
        let model = LinearModel::new(labels(&["a", "b"]), vec![vec![1.0, 1.0, 1.0]], vec![0.0]);
        let vocabulary: HashMap<String, usize> = [("x1".to_string(), 0)].into_iter().collect();

        let err = InferenceAdapter::from_parts(Arc::new(model), Some(TfidfVectorizer::new(vocabulary, None)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::ModelLoad(_)));
    }
}
