//! Request DTOs for the prediction API

use serde::Deserialize;

fn default_use_cache() -> bool {
    true
}

/// Query string of `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictQuery {
    /// Read through the cache (default) or always recompute
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl Default for PredictQuery {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
        }
    }
}

/// Query string of `GET /cache/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheInfoQuery {
    pub cache_key: String,
}

impl CacheInfoQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.cache_key.trim().is_empty() {
            return Some("cache_key cannot be empty".to_string());
        }
        None
    }
}
