//! The flattened JSON serialization: the single recipient's members
//! inlined at the top level

use alloc::string::String;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_protected, ParseError, SerializeError};
use crate::{
    base64_url::{Base64UrlBytes, Base64UrlString},
    header::JweHeader,
    jwe::{JsonWebEncryption, Recipient},
};

#[derive(Serialize, Deserialize)]
struct Repr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protected: Option<Base64UrlString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected: Option<JweHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<JweHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypted_key: Option<Base64UrlBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<Base64UrlBytes>,
    iv: Base64UrlBytes,
    ciphertext: Base64UrlBytes,
    tag: Base64UrlBytes,
}

pub(crate) fn serialize(jwe: &JsonWebEncryption) -> Result<String, SerializeError> {
    let [recipient] = jwe.recipients() else {
        return Err(SerializeError::RequiresSingleRecipient(
            jwe.recipients().len(),
        ));
    };

    let repr = Repr {
        protected: (!jwe.encoded_protected_header().is_empty())
            .then(|| jwe.encoded_protected_header().clone()),
        unprotected: (!jwe.shared_unprotected_header().is_empty())
            .then(|| jwe.shared_unprotected_header().clone()),
        header: (!recipient.header().is_empty()).then(|| recipient.header().clone()),
        encrypted_key: (!recipient.encrypted_key().is_empty())
            .then(|| Base64UrlBytes(recipient.encrypted_key().to_vec())),
        aad: jwe
            .additional_authenticated_data()
            .map(|aad| Base64UrlBytes(aad.to_vec())),
        iv: Base64UrlBytes(jwe.iv().to_vec()),
        ciphertext: Base64UrlBytes(jwe.ciphertext().to_vec()),
        tag: Base64UrlBytes(jwe.tag().to_vec()),
    };

    serde_json::to_string(&repr).map_err(SerializeError::Json)
}

pub(crate) fn parse(value: Value) -> Result<JsonWebEncryption, ParseError> {
    let repr: Repr = serde_json::from_value(value).map_err(ParseError::Json)?;

    let encoded_protected = repr.protected.unwrap_or_default();
    let protected = decode_protected(&encoded_protected)?;

    let recipient = Recipient::new(
        repr.header.unwrap_or_default(),
        repr.encrypted_key.map(|k| k.0).unwrap_or_default(),
    );

    Ok(JsonWebEncryption::from_parts(
        protected,
        encoded_protected,
        repr.unprotected.unwrap_or_default(),
        alloc::vec![recipient],
        repr.iv.0,
        repr.ciphertext.0,
        repr.tag.0,
        repr.aad.map(|aad| aad.0),
    ))
}
