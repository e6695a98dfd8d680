//! Common test helpers.

use jwe::{header::JweHeader, registry::AlgorithmRegistry};

/// A registry with every built-in algorithm.
pub fn registry() -> AlgorithmRegistry {
    AlgorithmRegistry::with_defaults()
}

/// Builds a header from a `json!` object literal.
pub fn header(value: serde_json::Value) -> JweHeader {
    match value {
        serde_json::Value::Object(map) => JweHeader::from_map(map),
        _ => panic!("header literals must be JSON objects"),
    }
}
