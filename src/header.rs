//! The JOSE header of a JWE as defined in [section 4 of RFC 7516]
//!
//! A JWE carries up to three header maps: the integrity-protected shared
//! header, the shared unprotected header and one unprotected header per
//! recipient. Algorithm resolution for a recipient always happens against
//! the [merged view](JweHeader::merged) of the three.
//!
//! [section 4 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-4>

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use base64ct::{Base64UrlUnpadded, Encoding};
use mediatype::{MediaType, MediaTypeBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jwa::{CompressionAlgorithm, ContentEncryptionAlgorithm, KeyManagementAlgorithm};

/// One JWE header map.
///
/// Registered parameters (`alg`, `enc`, `zip`, `kid`, `cty`) have typed
/// accessors; everything else passes through opaquely via
/// [`get`](Self::get) and [`insert`](Self::insert).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct JweHeader(Map<String, Value>);

impl JweHeader {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps an existing JSON object.
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Whether this header carries no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up an arbitrary parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sets an arbitrary parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// The key management algorithm (`alg`), if present.
    pub fn algorithm(&self) -> Option<KeyManagementAlgorithm> {
        self.string_param("alg").map(|s| {
            KeyManagementAlgorithm::from_str_without_other(s)
                .unwrap_or_else(|| KeyManagementAlgorithm::Other(s.to_string()))
        })
    }

    /// Sets the key management algorithm (`alg`).
    pub fn set_algorithm(&mut self, alg: KeyManagementAlgorithm) {
        self.insert("alg", Value::String(alg.to_string()));
    }

    /// The content encryption algorithm (`enc`), if present.
    pub fn content_encryption(&self) -> Option<ContentEncryptionAlgorithm> {
        self.string_param("enc").map(|s| {
            ContentEncryptionAlgorithm::from_str_without_other(s)
                .unwrap_or_else(|| ContentEncryptionAlgorithm::Other(s.to_string()))
        })
    }

    /// Sets the content encryption algorithm (`enc`).
    pub fn set_content_encryption(&mut self, enc: ContentEncryptionAlgorithm) {
        self.insert("enc", Value::String(enc.to_string()));
    }

    /// The compression method (`zip`), if present.
    pub fn compression(&self) -> Option<CompressionAlgorithm> {
        self.string_param("zip").map(|s| {
            CompressionAlgorithm::from_str_without_other(s)
                .unwrap_or_else(|| CompressionAlgorithm::Other(s.to_string()))
        })
    }

    /// Sets the compression method (`zip`).
    pub fn set_compression(&mut self, zip: CompressionAlgorithm) {
        self.insert("zip", Value::String(zip.to_string()));
    }

    /// The key id (`kid`), if present.
    pub fn key_id(&self) -> Option<&str> {
        self.string_param("kid")
    }

    /// Sets the key id (`kid`).
    pub fn set_key_id(&mut self, kid: impl Into<String>) {
        self.insert("kid", Value::String(kid.into()));
    }

    /// The content type (`cty`) of the payload, if present and well formed.
    pub fn content_type(&self) -> Option<MediaTypeBuf> {
        self.string_param("cty")?.parse().ok()
    }

    /// Sets the content type (`cty`) of the payload.
    pub fn set_content_type(&mut self, cty: &MediaType<'_>) {
        self.insert("cty", Value::String(cty.to_string()));
    }

    /// The merged header view for one recipient.
    ///
    /// The union of the shared protected header, the shared unprotected
    /// header and the recipient's own unprotected header. On a parameter
    /// name collision the per-recipient value takes precedence, then the
    /// shared unprotected one.
    pub fn merged(protected: &JweHeader, unprotected: &JweHeader, recipient: &JweHeader) -> Self {
        let mut merged = protected.0.clone();
        for (name, value) in &unprotected.0 {
            merged.insert(name.clone(), value.clone());
        }
        for (name, value) in &recipient.0 {
            merged.insert(name.clone(), value.clone());
        }
        Self(merged)
    }

    /// Merges the parameters emitted by a key management algorithm during
    /// wrapping into this header.
    pub(crate) fn extend(&mut self, params: Map<String, Value>) {
        for (name, value) in params {
            self.0.insert(name, value);
        }
    }

    fn string_param(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// A parameter holding base64url encoded bytes (`iv`, `tag`, `apu`,
    /// `apv`).
    pub(crate) fn bytes_param(&self, name: &str) -> Option<Vec<u8>> {
        Base64UrlUnpadded::decode_vec(self.string_param(name)?).ok()
    }

    /// A parameter holding a JSON object (`epk`).
    pub(crate) fn object_param(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }
}

impl From<Map<String, Value>> for JweHeader {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
