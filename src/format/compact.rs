//! The compact serialization: five dot-separated base64url segments
//! (`protected.encrypted_key.iv.ciphertext.tag`)

use alloc::{string::String, vec::Vec};
use core::str::FromStr;

use super::{decode_protected, ParseError, SerializeError};
use crate::{
    base64_url::Base64UrlString,
    jwe::{JsonWebEncryption, Recipient},
};

pub(crate) fn serialize(jwe: &JsonWebEncryption) -> Result<String, SerializeError> {
    let [recipient] = jwe.recipients() else {
        return Err(SerializeError::RequiresSingleRecipient(
            jwe.recipients().len(),
        ));
    };

    // Only integrity-protected headers are representable.
    if !jwe.shared_unprotected_header().is_empty() || !recipient.header().is_empty() {
        return Err(SerializeError::UnprotectedHeaders);
    }
    if jwe.additional_authenticated_data().is_some() {
        return Err(SerializeError::ExternalAad);
    }

    let mut out = String::new();
    out.push_str(jwe.encoded_protected_header());
    for segment in [
        recipient.encrypted_key(),
        jwe.iv(),
        jwe.ciphertext(),
        jwe.tag(),
    ] {
        out.push('.');
        out.push_str(&Base64UrlString::encode(segment));
    }

    Ok(out)
}

pub(crate) fn parse(input: &str) -> Result<JsonWebEncryption, ParseError> {
    let segments: Vec<&str> = input.split('.').collect();
    let [protected, encrypted_key, iv, ciphertext, tag] = segments[..] else {
        return Err(ParseError::InvalidSegmentCount(segments.len()));
    };

    let encoded_protected = Base64UrlString::from_str(protected)?;
    let protected = decode_protected(&encoded_protected)?;

    let recipient = Recipient::new(
        crate::header::JweHeader::new(),
        Base64UrlString::from_str(encrypted_key)?.decode(),
    );

    Ok(JsonWebEncryption::from_parts(
        protected,
        encoded_protected,
        crate::header::JweHeader::new(),
        alloc::vec![recipient],
        Base64UrlString::from_str(iv)?.decode(),
        Base64UrlString::from_str(ciphertext)?.decode(),
        Base64UrlString::from_str(tag)?.decode(),
        None,
    ))
}
