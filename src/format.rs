//! The wire serializations of a JWE as defined in [section 3 of RFC 7516]
//!
//! A JWE travels in one of three forms:
//!
//! - the **compact serialization**, five dot-separated base64url segments,
//!   limited to a single recipient and no unprotected headers;
//! - the **general JSON serialization**, a JSON object with a `recipients`
//!   array, representing everything;
//! - the **flattened JSON serialization**, the single-recipient JSON form
//!   with the recipient's members inlined at the top level.
//!
//! [`JsonWebEncryption::serialize`] picks the form explicitly via
//! [`JweFormat`]; parsing via [`str::parse`] auto-detects it.
//!
//! [section 3 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-3>

mod compact;
mod json_flattened;
mod json_general;

use alloc::string::String;

use thiserror::Error;

use crate::{base64_url::NoBase64UrlString, jwe::JsonWebEncryption};

/// The serialization to produce from a [`JsonWebEncryption`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JweFormat {
    /// The compact serialization (`a.b.c.d.e`).
    Compact,
    /// The flattened JSON serialization (single recipient).
    JsonFlattened,
    /// The general JSON serialization (any number of recipients).
    JsonGeneral,
}

/// Malformed wire input.
///
/// These errors concern the transport framing, not any secret data, and
/// are precise on purpose.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The compact serialization must have exactly five segments.
    #[error("expected 5 dot-separated segments, found {0}")]
    InvalidSegmentCount(usize),
    /// A segment was not valid base64url.
    #[error(transparent)]
    InvalidBase64Url(#[from] NoBase64UrlString),
    /// The input was not the JSON structure the serialization requires.
    #[error("invalid JSON structure: {0}")]
    Json(serde_json::Error),
    /// The protected header did not decode into a JSON object.
    #[error("the protected header is not a JSON object")]
    ProtectedHeaderNotAnObject,
}

/// A [`JsonWebEncryption`] that does not fit the requested serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// The compact and flattened serializations hold exactly one recipient.
    #[error("this serialization requires exactly one recipient, found {0}")]
    RequiresSingleRecipient(usize),
    /// The compact serialization cannot express unprotected headers.
    #[error("the compact serialization forbids unprotected headers")]
    UnprotectedHeaders,
    /// The compact serialization cannot express external AAD.
    #[error("the compact serialization forbids external additional authenticated data")]
    ExternalAad,
    /// The JSON structure could not be serialized.
    #[error("failed to serialize: {0}")]
    Json(serde_json::Error),
}

pub(crate) fn serialize(
    jwe: &JsonWebEncryption,
    format: JweFormat,
) -> Result<String, SerializeError> {
    match format {
        JweFormat::Compact => compact::serialize(jwe),
        JweFormat::JsonFlattened => json_flattened::serialize(jwe),
        JweFormat::JsonGeneral => json_general::serialize(jwe),
    }
}

pub(crate) fn deserialize(input: &str) -> Result<JsonWebEncryption, ParseError> {
    if input.trim_start().starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(ParseError::Json)?;

        if value.get("recipients").is_some() {
            json_general::parse(value)
        } else {
            json_flattened::parse(value)
        }
    } else {
        compact::parse(input)
    }
}

/// Decodes the `protected` segment into its header map, keeping the wire
/// form untouched for AAD reconstruction.
pub(crate) fn decode_protected(
    encoded: &crate::Base64UrlString,
) -> Result<crate::header::JweHeader, ParseError> {
    if encoded.is_empty() {
        return Ok(crate::header::JweHeader::new());
    }

    let value: serde_json::Value =
        serde_json::from_slice(&encoded.decode()).map_err(ParseError::Json)?;

    match value {
        serde_json::Value::Object(map) => Ok(crate::header::JweHeader::from_map(map)),
        _ => Err(ParseError::ProtectedHeaderNotAnObject),
    }
}
