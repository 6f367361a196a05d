//! API Module
//!
//! HTTP handlers and routing for the prediction service REST API.
//!
//! # Endpoints
//! - `POST /predict` - Predict with optional cache bypass
//! - `GET /model/info` - Loaded model metadata
//! - `GET /cache/stats` - Cache and model health
//! - `GET /cache/info` - Metadata of one cached prediction
//! - `DELETE /cache` - Flush the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
