//! Prediction Service
//!
//! Composes key derivation, the cache client and the inference adapter into
//! the read-through prediction workflow.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cache::{CacheClient, KeyDeriver};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::inference::{InferenceAdapter, ModelInfo, PredictionInput, PredictionResult};
use crate::prediction::{CacheEntryMetadata, ServiceStats};

// == Prediction Service ==
/// Shared entry point for predictions, cache metadata and health.
///
/// Only inference failures are returned as errors. Every cache failure is
/// absorbed by the client and degrades to recomputing.
pub struct PredictionService {
    cache: CacheClient,
    model: Arc<InferenceAdapter>,
    keys: KeyDeriver,
}

impl PredictionService {
    pub fn new(cache: CacheClient, model: Arc<InferenceAdapter>, keys: KeyDeriver) -> Self {
        Self { cache, model, keys }
    }

    // == Initialize ==
    /// Loads the model, then connects the cache. Both failures are fatal.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let model = InferenceAdapter::load(&config.model_path, config.vectorizer_path.as_deref())?;
        let cache = CacheClient::connect(config).await?;
        let keys = KeyDeriver::new(config.cache_key_prefix.clone());

        info!(
            backend = cache.backend_name(),
            prefix = keys.prefix(),
            ttl_secs = cache.default_ttl().as_secs(),
            "Prediction service initialized"
        );

        Ok(Self::new(cache, Arc::new(model), keys))
    }

    // == Predict ==
    /// Predicts for `input`, reading through the cache when `use_cache` is set.
    ///
    /// A hit returns the stored result without calling the model. A miss
    /// computes, stores, and reports in `cached` whether the store accepted
    /// the write.
    pub async fn predict_single(
        &self,
        input: &PredictionInput,
        use_cache: bool,
    ) -> Result<PredictionResult> {
        if !use_cache {
            let mut result = self.infer(input)?;
            result.input_size = input.input_size();
            return Ok(result);
        }

        let key = self.keys.derive(&input.canonical_value());

        if let Some(mut hit) = self.cache.get::<PredictionResult>(key.as_str()).await {
            info!(cache_key = %key, "Returning cached prediction");
            hit.from_cache = true;
            hit.cached = None;
            hit.cache_key = Some(key.into_string());
            return Ok(hit);
        }

        let mut result = self.infer(input)?;
        result.cache_key = Some(key.to_string());
        result.input_size = input.input_size();

        let stored = self.cache.set(key.as_str(), &result, None).await;
        result.cached = Some(stored);
        debug!(cache_key = %key, stored, "Computed fresh prediction");

        Ok(result)
    }

    // == Prediction Info ==
    /// Describes the stored prediction under `cache_key`, if any.
    pub async fn prediction_info(&self, cache_key: &str) -> CacheEntryMetadata {
        match self.cache.get::<PredictionResult>(cache_key).await {
            Some(stored) => {
                let ttl = self.cache.ttl(cache_key).await;
                CacheEntryMetadata::found(cache_key, &stored, ttl)
            }
            None => CacheEntryMetadata::not_found(cache_key),
        }
    }

    // == Cache Stats ==
    /// Runs both health checks independently and aggregates them.
    pub async fn cache_stats(&self) -> ServiceStats {
        let (cache_status, model_status) =
            tokio::join!(self.cache.health_check(), async { self.model.health_check() });

        ServiceStats::aggregate(cache_status, model_status)
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model.describe()
    }

    pub async fn flush_cache(&self) -> bool {
        self.cache.flush_all().await
    }

    // == Shutdown ==
    /// Releases the model and closes the cache client.
    pub fn shutdown(&self) {
        self.model.unload();
        self.cache.close();
        info!("Prediction service shut down");
    }

    fn infer(&self, input: &PredictionInput) -> Result<PredictionResult> {
        self.model.predict(input).map_err(|e| {
            error!(kind = input.kind(), error = %e, "Prediction failed");
            ServiceError::from(e)
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{codec, KvBackend, MemoryBackend};
    use crate::inference::{Classifier, InferenceError, LinearModel, TfidfVectorizer};
    use crate::prediction::ServiceStatus;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Linear model that counts how often it is asked to predict.
    #[derive(Debug)]
    struct CountingClassifier {
        inner: LinearModel,
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for CountingClassifier {
        fn model_type(&self) -> &str {
            self.inner.model_type()
        }
        fn n_features(&self) -> usize {
            self.inner.n_features()
        }
        fn classes(&self) -> &[String] {
            self.inner.classes()
        }
        fn predict(&self, rows: &[Vec<f64>]) -> std::result::Result<Vec<String>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.predict(rows)
        }
        fn has_proba(&self) -> bool {
            true
        }
        fn predict_proba(&self, rows: &[Vec<f64>]) -> std::result::Result<Vec<Vec<f64>>, InferenceError> {
            self.inner.predict_proba(rows)
        }
    }

    struct Fixture {
        service: PredictionService,
        backend: Arc<MemoryBackend>,
        calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = CountingClassifier {
            inner: LinearModel::new(
                vec!["negative".into(), "positive".into()],
                vec![vec![3.0, -3.0]],
                vec![0.0],
            ),
            calls: calls.clone(),
        };
        let vocabulary: HashMap<String, usize> = [("great", 0), ("awful", 1)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        let model = InferenceAdapter::from_parts(
            Arc::new(classifier),
            Some(TfidfVectorizer::new(vocabulary, None)),
        )
        .unwrap();

        let backend = Arc::new(MemoryBackend::new());
        let cache = CacheClient::with_backend(
            backend.clone(),
            Duration::from_secs(3000),
            Duration::from_secs(5),
        );

        Fixture {
            service: PredictionService::new(cache, Arc::new(model), KeyDeriver::default()),
            backend,
            calls,
        }
    }

    fn record(text: &str) -> PredictionInput {
        serde_json::from_value(json!({ "text": text })).unwrap()
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let fx = fixture();
        let input = record("great product");

        let first = fx.service.predict_single(&input, true).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.cached, Some(true));
        assert_eq!(first.input_size, Some(1));
        let key = first.cache_key.clone().unwrap();
        assert!(key.starts_with("ml_pred:"));
        assert_eq!(key.len(), "ml_pred:".len() + 16);

        let second = fx.service.predict_single(&input, true).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.cache_key, Some(key));
        assert_eq!(second.prediction, first.prediction);
        assert_eq!(second.prediction, vec!["positive".to_string()]);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_use_cache_false_bypasses_store() {
        let fx = fixture();
        let input = record("awful");

        let result = fx.service.predict_single(&input, false).await.unwrap();
        assert!(!result.from_cache);
        assert!(result.cache_key.is_none());
        assert!(result.cached.is_none());

        fx.service.predict_single(&input, false).await.unwrap();
        assert_eq!(fx.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fx.backend.len().await, 0);
    }

    #[tokio::test]
    async fn test_store_outage_still_predicts() {
        let fx = fixture();
        fx.service.cache.close();

        let input = record("great");
        let first = fx.service.predict_single(&input, true).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.cached, Some(false));

        let second = fx.service.predict_single(&input, true).await.unwrap();
        assert!(!second.from_cache);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_integer_features_keyed_as_sent() {
        let fx = fixture();
        let input: PredictionInput = serde_json::from_str("[1, 2]").unwrap();

        let result = fx.service.predict_single(&input, true).await.unwrap();
        assert_eq!(result.cache_key.as_deref(), Some("ml_pred:3a316d6d3226f84c"));

        let floats: PredictionInput = serde_json::from_str("[1.0, 2.0]").unwrap();
        let other = fx.service.predict_single(&floats, true).await.unwrap();
        assert!(!other.from_cache);
        assert_ne!(other.cache_key, result.cache_key);
    }

    #[tokio::test]
    async fn test_inference_failure_is_surfaced() {
        let fx = fixture();
        let input = serde_json::from_str::<PredictionInput>("[1, 2, 3]").unwrap();

        let err = fx.service.predict_single(&input, true).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PredictionFailed(InferenceError::FeatureMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_cached_flags_overwritten_on_read() {
        let fx = fixture();
        let input = record("great");
        let key = KeyDeriver::default().derive(&input.canonical_value());

        // A record stored by an older writer, carrying stale flags.
        let mut stale = fx.service.predict_single(&input, false).await.unwrap();
        stale.from_cache = false;
        stale.cached = Some(true);
        stale.cache_key = Some("ml_pred:stale".into());
        let bytes = codec::encode_to_vec(&stale).unwrap();
        fx.backend.set_ex(key.as_str(), bytes, 60).await.unwrap();

        let hit = fx.service.predict_single(&input, true).await.unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.cached, None);
        assert_eq!(hit.cache_key.as_deref(), Some(key.as_str()));
    }

    #[tokio::test]
    async fn test_prediction_info() {
        let fx = fixture();

        let missing = fx.service.prediction_info("ml_pred:unknown").await;
        assert!(!missing.exists);
        assert_eq!(missing.message.as_deref(), Some("Prediction not found in cache"));

        let result = fx.service.predict_single(&record("great"), true).await.unwrap();
        let key = result.cache_key.unwrap();

        let info = fx.service.prediction_info(&key).await;
        assert!(info.exists);
        assert_eq!(info.ttl_seconds, Some(3000));
        assert_eq!(info.model_type.as_deref(), Some("LogisticRegression"));
        assert_eq!(info.has_probabilities, Some(true));
        assert_eq!(info.prediction_summary.unwrap().prediction, vec!["positive".to_string()]);
    }

    #[tokio::test]
    async fn test_flush_then_info_reports_missing() {
        let fx = fixture();
        let key = fx
            .service
            .predict_single(&record("great"), true)
            .await
            .unwrap()
            .cache_key
            .unwrap();

        assert!(fx.service.flush_cache().await);
        assert!(!fx.service.prediction_info(&key).await.exists);
    }

    #[tokio::test]
    async fn test_cache_stats_aggregation() {
        let fx = fixture();
        assert_eq!(fx.service.cache_stats().await.service_status, ServiceStatus::Healthy);

        fx.service.model.unload();
        let stats = fx.service.cache_stats().await;
        assert_eq!(stats.service_status, ServiceStatus::Degraded);
        assert!(stats.cache_status.is_healthy());
        assert!(!stats.model_status.is_healthy());
    }

    #[tokio::test]
    async fn test_shutdown_degrades_everything() {
        let fx = fixture();
        fx.service.shutdown();

        let stats = fx.service.cache_stats().await;
        assert!(!stats.cache_status.is_healthy());
        assert!(!stats.model_status.is_healthy());

        let err = fx.service.predict_single(&record("great"), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::PredictionFailed(InferenceError::NotLoaded)));
    }
}
