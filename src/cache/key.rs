//! Cache Key Module
//!
//! Derives deterministic, fixed-length cache keys from prediction payloads.
//!
//! Canonical form:
//! - mappings are written as JSON with keys sorted at every depth
//! - sequences are written as JSON preserving element order
//! - a bare string is used as-is
//! - a bare boolean or null is written `True`, `False` or `None`, and a bare
//!   number uses its JSON text, so they hash like the text form older
//!   deployments produced for them
//!
//! The JSON writer uses `", "` / `": "` separators and escapes every
//! non-ASCII character as `\uXXXX`, so keys match those written by earlier
//! deployments of the service for the same payloads.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "ml_pred";

/// Number of hex characters of the SHA-256 digest kept in a key (64 bits).
pub const DIGEST_HEX_LEN: usize = 16;

// == Cache Key ==
/// A derived cache key of the form `<prefix>:<16 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// The hex digest part of the key.
    pub fn digest(&self) -> &str {
        self.0
            .rsplit_once(':')
            .map(|(_, digest)| digest)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

// == Key Deriver ==
/// Derives cache keys under a fixed prefix.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    prefix: String,
}

impl KeyDeriver {
    /// Creates a deriver for the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix every derived key starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the key for `input`.
    pub fn derive(&self, input: &Value) -> CacheKey {
        derive_key(input, &self.prefix)
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Derives the cache key for `input` under `prefix`.
///
/// Pure: the same canonical input always yields the same key, within and
/// across process runs.
pub fn derive_key(input: &Value, prefix: &str) -> CacheKey {
    let normalized = canonicalize(input);
    let hex = format!("{:x}", Sha256::digest(normalized.as_bytes()));

    CacheKey(format!("{}:{}", prefix, &hex[..DIGEST_HEX_LEN]))
}

/// Returns the canonical text hashed for `input`.
pub fn canonicalize(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            let mut out = String::new();
            write_canonical(&mut out, input);
            out
        }
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::Number(n) => n.to_string(),
    }
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        // Without serde_json's `preserve_order` feature `Map` is a BTreeMap,
        // so iteration is already in sorted key order.
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_canonical(out, item);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::String(s) => write_string(out, s),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
