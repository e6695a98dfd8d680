//! Implementation of JSON Web Encryption (JWE) as defined in [RFC 7516]
//!
//! [RFC 7516]: <https://www.rfc-editor.org/rfc/rfc7516.html>

mod builder;
mod decrypt;

use alloc::{string::String, vec::Vec};
use core::str::FromStr;

use serde_json::Error as JsonError;
use thiserror::Error;

#[doc(inline)]
pub use self::{builder::JweBuilder, decrypt::JweDecrypter};
use crate::{
    base64_url::Base64UrlString,
    crypto,
    format::{self, JweFormat, ParseError, SerializeError},
    header::JweHeader,
};

/// An error in the configuration of an operation: something about the
/// caller's own inputs — headers, keys, allowlists, builder state — is
/// wrong.
///
/// These errors are precise and raised before any cryptographic work runs;
/// they never depend on attacker-controlled secrets and may be surfaced
/// verbatim.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The algorithm is not implemented or not in the allowlist of the
    /// registry in use.
    #[error("algorithm `{0}` is not supported or not allowed")]
    UnsupportedAlgorithm(String),
    /// The compression method is not implemented or not in the allowlist of
    /// the registry in use.
    #[error("compression method `{0}` is not supported or not allowed")]
    UnsupportedCompression(String),
    /// The key's declared metadata forbids the attempted operation.
    #[error("key usage violation: {0}")]
    KeyUsageViolation(&'static str),
    /// The builder was finalized without a payload.
    #[error("a payload is required")]
    MissingPayload,
    /// The operation needs at least one recipient.
    #[error("at least one recipient is required")]
    NoRecipients,
    /// A required header parameter could not be resolved from the merged
    /// header view.
    #[error("missing required header parameter `{0}`")]
    MissingHeader(&'static str),
    /// The recipients resolve to different `enc` values, but all recipients
    /// of a JWE share one ciphertext.
    #[error("all recipients must agree on the content encryption algorithm")]
    ContentEncryptionMismatch,
    /// More than one recipient uses a direct key management mode; the CEK
    /// can only have a single source.
    #[error("at most one recipient may use a direct key management mode")]
    DirectModeConflict,
    /// A direct-mode key does not match the size the content encryption
    /// algorithm requires.
    #[error("invalid key length: expected {expected} bytes, found {found}")]
    InvalidKeyLength {
        /// The size the content encryption algorithm requires.
        expected: usize,
        /// The size of the supplied key material.
        found: usize,
    },
    /// The requested recipient does not exist in the JWE.
    #[error("recipient index {0} is out of range")]
    RecipientIndex(usize),
    /// The shared protected header could not be serialized.
    #[error("failed to serialize the protected header: {0}")]
    SerializeHeader(JsonError),
    /// A cryptographic operation failed while building.
    #[error(transparent)]
    Crypto(crypto::Error),
    /// The payload could not be compressed.
    #[error("payload compression failed")]
    Compression,
}

/// Decryption did not succeed.
///
/// This error is deliberately opaque: whether a recipient's key did not
/// unwrap, the ciphertext was malformed or the authentication tag did not
/// verify must be indistinguishable to the caller — and to anyone able to
/// observe the caller. Do not refine it.
#[derive(Debug, Error)]
#[error("decryption failed")]
pub struct DecryptionFailed;

/// The error type of [`JweDecrypter`] operations.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// The operation was misconfigured; nothing cryptographic was attempted
    /// for the failing recipient.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The single, generic cryptographic failure.
    #[error(transparent)]
    Failed(#[from] DecryptionFailed),
}

/// One recipient of a [`JsonWebEncryption`]: its unprotected header and its
/// encrypted CEK (empty for direct key management modes).
#[derive(Debug, Clone, Default)]
pub struct Recipient {
    header: JweHeader,
    encrypted_key: Vec<u8>,
}

impl Recipient {
    pub(crate) const fn new(header: JweHeader, encrypted_key: Vec<u8>) -> Self {
        Self {
            header,
            encrypted_key,
        }
    }

    /// This recipient's unprotected header.
    pub const fn header(&self) -> &JweHeader {
        &self.header
    }

    /// This recipient's encrypted CEK. Empty for direct modes.
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }
}

/// A JSON Web Encryption object.
///
/// Produced either by [`JweBuilder::build`] (encryption) or by parsing one
/// of the wire serializations (see [`FromStr`]); immutable afterwards. Use
/// [`JweDecrypter`] to recover the plaintext.
///
/// The shared protected header is kept in the exact base64url form it was
/// produced or received in: those bytes are the additional authenticated
/// data of the envelope, so any mutation of them invalidates the
/// authentication tag by design.
#[derive(Debug, Clone)]
pub struct JsonWebEncryption {
    protected: JweHeader,
    encoded_protected: Base64UrlString,
    unprotected: JweHeader,
    recipients: Vec<Recipient>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
    aad: Option<Vec<u8>>,
}

impl JsonWebEncryption {
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn from_parts(
        protected: JweHeader,
        encoded_protected: Base64UrlString,
        unprotected: JweHeader,
        recipients: Vec<Recipient>,
        iv: Vec<u8>,
        ciphertext: Vec<u8>,
        tag: Vec<u8>,
        aad: Option<Vec<u8>>,
    ) -> Self {
        Self {
            protected,
            encoded_protected,
            unprotected,
            recipients,
            iv,
            ciphertext,
            tag,
            aad,
        }
    }

    /// The shared protected header.
    pub const fn protected_header(&self) -> &JweHeader {
        &self.protected
    }

    /// The shared protected header in the exact base64url form that is
    /// integrity protected.
    pub const fn encoded_protected_header(&self) -> &Base64UrlString {
        &self.encoded_protected
    }

    /// The shared unprotected header.
    pub const fn shared_unprotected_header(&self) -> &JweHeader {
        &self.unprotected
    }

    /// The recipients of this JWE, in order.
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// The initialization vector.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// The ciphertext.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The authentication tag.
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// The external additional authenticated data, if any.
    pub fn additional_authenticated_data(&self) -> Option<&[u8]> {
        self.aad.as_deref()
    }

    /// The merged header view for the given recipient.
    pub(crate) fn merged_header(&self, recipient: &Recipient) -> JweHeader {
        JweHeader::merged(&self.protected, &self.unprotected, &recipient.header)
    }

    /// The additional authenticated data for the content encryption, per
    /// step 14 of [section 5.1 of RFC 7516]: the ASCII bytes of the encoded
    /// protected header, extended with `'.' || BASE64URL(aad)` when
    /// external AAD is present.
    ///
    /// [section 5.1 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-5.1>
    pub(crate) fn content_aad(&self) -> Vec<u8> {
        let mut aad = self.encoded_protected.as_bytes().to_vec();
        if let Some(external) = &self.aad {
            aad.push(b'.');
            aad.extend_from_slice(Base64UrlString::encode(external).as_bytes());
        }
        aad
    }

    /// Serializes this JWE into the requested wire format.
    ///
    /// # Errors
    ///
    /// Fails if the JWE does not fit the format, e.g. multiple recipients
    /// or unprotected headers in the compact serialization.
    pub fn serialize(&self, format: JweFormat) -> Result<String, SerializeError> {
        format::serialize(self, format)
    }
}

impl FromStr for JsonWebEncryption {
    type Err = ParseError;

    /// Parses any of the three serializations, auto-detecting which one was
    /// supplied: JSON input is recognized by its leading `{`, and the
    /// general JSON form by its `recipients` member.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        format::deserialize(s)
    }
}
