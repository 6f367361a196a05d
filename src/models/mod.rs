//! Request and Response models for the prediction API
//!
//! DTOs for the HTTP query strings and JSON response bodies. Prediction
//! bodies themselves are decoded straight into `PredictionInput`.

pub mod requests;
pub mod responses;

pub use requests::{CacheInfoQuery, PredictQuery};
pub use responses::{
    CacheInfoResponse, CacheStatsResponse, ErrorResponse, FlushResponse, HealthResponse,
    ModelInfoResponse, PredictionMetadata, PredictionResponse,
};
