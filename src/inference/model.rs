//! Classifier Module
//!
//! The model seam and the linear classifier read from the model artifact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inference::InferenceError;

// == Classifier ==
/// A loaded, read-only classification model.
///
/// Implementations must be safe for unbounded concurrent calls.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Type name reported in model metadata.
    fn model_type(&self) -> &str;

    /// Width of every input row.
    fn n_features(&self) -> usize;

    /// Class labels in model order.
    fn classes(&self) -> &[String];

    /// Names of the input features, when the model was trained on records.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predicts one label per row.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<String>, InferenceError>;

    /// Whether [`Classifier::predict_proba`] is supported.
    fn has_proba(&self) -> bool {
        false
    }

    /// Per-class probabilities per row, in [`Classifier::classes`] order.
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, InferenceError> {
        Err(InferenceError::ProbabilitiesUnavailable)
    }
}

fn default_model_type() -> String {
    "LogisticRegression".to_string()
}

// == Linear Model ==
/// Linear classifier with logistic (binary) or softmax (multi-class) output.
///
/// A single coefficient row with two classes is a binary model: a positive
/// decision score selects the second class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_model_type")]
    model_type: String,
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

impl LinearModel {
    pub fn new(classes: Vec<String>, coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Self {
        Self {
            model_type: default_model_type(),
            classes,
            coef,
            intercept,
            feature_names: None,
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    fn is_binary(&self) -> bool {
        self.coef.len() == 1 && self.classes.len() == 2
    }

    /// Checks shapes and weights after deserialization.
    pub fn validate(&self) -> Result<(), InferenceError> {
        let invalid = |msg: String| Err(InferenceError::InvalidModel(msg));

        if self.classes.len() < 2 {
            return invalid(format!("need at least 2 classes, got {}", self.classes.len()));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return invalid(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            ));
        }
        if self.intercept.len() != self.coef.len() {
            return invalid(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            ));
        }

        let width = self.n_features();
        if width == 0 || self.coef.iter().any(|row| row.len() != width) {
            return invalid("coefficient rows must share a non-zero width".to_string());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != width {
                return invalid(format!("{} feature names for {} features", names.len(), width));
            }
        }

        let finite = self
            .coef
            .iter()
            .flatten()
            .chain(&self.intercept)
            .all(|w| w.is_finite());
        if !finite {
            return invalid("weights must be finite".to_string());
        }

        Ok(())
    }

    /// Raw decision scores for one row.
    fn decision(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if row.len() != self.n_features() {
            return Err(InferenceError::FeatureMismatch {
                expected: self.n_features(),
                actual: row.len(),
            });
        }

        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, bias)| weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect())
    }
}

impl Classifier for LinearModel {
    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<String>, InferenceError> {
        rows.iter()
            .map(|row| {
                let scores = self.decision(row)?;
                let index = if self.is_binary() {
                    usize::from(scores[0] > 0.0)
                } else {
                    argmax(&scores)
                };
                self.classes.get(index).cloned().ok_or_else(|| {
                    InferenceError::InvalidModel(format!("no class for output {}", index))
                })
            })
            .collect()
    }

    fn has_proba(&self) -> bool {
        true
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, InferenceError> {
        rows.iter()
            .map(|row| {
                let scores = self.decision(row)?;
                Ok(if self.is_binary() {
                    let positive = sigmoid(scores[0]);
                    vec![1.0 - positive, positive]
                } else {
                    softmax(&scores)
                })
            })
            .collect()
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn binary() -> LinearModel {
        LinearModel::new(labels(&["negative", "positive"]), vec![vec![2.0, -3.0]], vec![0.0])
    }

    #[test]
    fn test_binary_predict() {
        let model = binary();
        assert!(model.validate().is_ok());

        let predictions = model.predict(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(predictions, labels(&["positive", "negative"]));
    }

    #[test]
    fn test_binary_proba_sums_to_one() {
        let proba = binary().predict_proba(&[vec![1.0, 0.0]]).unwrap();
        assert_eq!(proba[0].len(), 2);
        assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((proba[0][1] - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_multiclass_softmax() {
        let model = LinearModel::new(
            labels(&["a", "b", "c"]),
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![0.0, 0.0, 0.0],
        );
        assert!(model.validate().is_ok());

        assert_eq!(model.predict(&[vec![1.0]]).unwrap(), labels(&["c"]));
        assert_eq!(model.predict(&[vec![-1.0]]).unwrap(), labels(&["a"]));

        let proba = model.predict_proba(&[vec![1.0]]).unwrap();
        assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(proba[0][2] > proba[0][1] && proba[0][1] > proba[0][0]);
    }

    #[test]
    fn test_feature_mismatch() {
        let err = binary().predict(&[vec![1.0]]).unwrap_err();
        assert_eq!(err, InferenceError::FeatureMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_validate_shapes() {
        let model = LinearModel::new(labels(&["a", "b", "c"]), vec![vec![1.0]], vec![0.0]);
        assert!(model.validate().is_err());

        let model = LinearModel::new(labels(&["a", "b"]), vec![vec![1.0]], vec![]);
        assert!(model.validate().is_err());

        let model = binary().with_feature_names(labels(&["only_one"]));
        assert!(model.validate().is_err());

        let model = LinearModel::new(labels(&["a", "b"]), vec![vec![f64::NAN]], vec![0.0]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_deserialize_artifact() {
        let raw = r#"{
            "classes": ["negative", "positive"],
            "coef": [[0.5, -0.5]],
            "intercept": [0.1],
            "feature_names": ["f1", "f2"]
        }"#;
        let model: LinearModel = serde_json::from_str(raw).unwrap();
        assert!(model.validate().is_ok());
        assert_eq!(model.model_type(), "LogisticRegression");
        assert_eq!(model.feature_names().unwrap(), &labels(&["f1", "f2"])[..]);
    }
}
