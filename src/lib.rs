//! MicroML - A classification model served over HTTP
//!
//! Predictions read through a Redis (or in-process) cache keyed by a digest
//! of the canonicalized input.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod prediction;

pub use api::AppState;
pub use config::Config;
pub use prediction::PredictionService;
