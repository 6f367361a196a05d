//! Prediction Module
//!
//! Read-through caching of model predictions plus the metadata and health
//! reports built on top of the cache and the model.

mod report;
mod service;

pub use report::{CacheEntryMetadata, PredictionSummary, ServiceStats, ServiceStatus};
pub use service::PredictionService;
