//! Value Codec Module
//!
//! Serializes cached values for storage. JSON is the primary encoding;
//! values that JSON cannot carry faithfully take an opaque bincode path,
//! tagged with a marker so decoding dispatches without guessing.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Marker prepended to opaque payloads. JSON text never begins with `M`.
pub const OPAQUE_MARKER: &[u8; 4] = b"MLB\x01";

// == Codec Error ==
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("structured encoding failed: {0}")]
    Structured(#[from] serde_json::Error),

    #[error("opaque encoding failed: {0}")]
    Opaque(#[from] bincode::Error),
}

// == Storable ==
/// A value the cache can store.
pub trait Storable: Serialize + DeserializeOwned {
    /// Whether the JSON path round-trips this value unchanged.
    ///
    /// JSON cannot represent non-finite floats (they are written as `null`),
    /// so types holding floats override this.
    fn json_safe(&self) -> bool {
        true
    }
}

impl Storable for serde_json::Value {}
impl Storable for String {}

// == Encoded ==
/// The result of encoding a value, tagged by the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// UTF-8 JSON text
    Structured(Vec<u8>),
    /// bincode payload, without the marker
    Opaque(Vec<u8>),
}

impl Encoded {
    /// Splits stored bytes into their tagged form.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.starts_with(OPAQUE_MARKER) {
            Encoded::Opaque(bytes[OPAQUE_MARKER.len()..].to_vec())
        } else {
            Encoded::Structured(bytes)
        }
    }

    /// Returns the bytes written to the store.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Encoded::Structured(bytes) => bytes,
            Encoded::Opaque(payload) => {
                let mut bytes = Vec::with_capacity(OPAQUE_MARKER.len() + payload.len());
                bytes.extend_from_slice(OPAQUE_MARKER);
                bytes.extend_from_slice(&payload);
                bytes
            }
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Encoded::Structured(_))
    }
}

/// Encodes `value`, preferring JSON and falling back to bincode.
pub fn encode<T: Storable>(value: &T) -> Result<Encoded, CodecError> {
    if value.json_safe() {
        if let Ok(bytes) = serde_json::to_vec(value) {
            return Ok(Encoded::Structured(bytes));
        }
    }

    Ok(Encoded::Opaque(bincode::serialize(value)?))
}

/// Decodes stored bytes.
///
/// Marker-less bytes that are not valid JSON are retried as raw bincode.
pub fn decode<T: Storable>(bytes: Vec<u8>) -> Result<T, CodecError> {
    match Encoded::from_bytes(bytes) {
        Encoded::Opaque(payload) => Ok(bincode::deserialize(&payload)?),
        Encoded::Structured(text) => match serde_json::from_slice(&text) {
            Ok(value) => Ok(value),
            Err(json_err) => bincode::deserialize(&text).map_err(|_| json_err.into()),
        },
    }
}

/// Encodes `value` straight to the bytes written to the store.
pub fn encode_to_vec<T: Storable>(value: &T) -> Result<Vec<u8>, CodecError> {
    encode(value).map(Encoded::into_bytes)
}
