//! Inference Module
//!
//! Loads the classification model (and its optional text vectorizer) from
//! JSON artifacts and runs predictions over tagged inputs.

mod adapter;
mod input;
mod model;
mod result;
pub mod text;
mod vectorizer;

use thiserror::Error;

pub use adapter::{InferenceAdapter, ModelHealth, ModelInfo};
pub use input::PredictionInput;
pub use model::{Classifier, LinearModel};
pub use result::{PredictionModelInfo, PredictionResult};
pub use vectorizer::{Norm, TfidfVectorizer};

// == Inference Error ==
/// Any failure while turning an input into a prediction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model not loaded")]
    NotLoaded,

    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("text input requires a vectorizer, none is loaded")]
    MissingVectorizer,

    #[error("record is missing field '{0}'")]
    MissingField(String),

    #[error("record field '{0}' has the wrong type")]
    InvalidField(String),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("input batch is empty")]
    EmptyInput,

    #[error("model does not provide probabilities")]
    ProbabilitiesUnavailable,

    #[error("invalid model: {0}")]
    InvalidModel(String),
}
