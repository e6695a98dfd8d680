//! Key wrapping with AES GCM (`A128GCMKW`, `A192GCMKW`, `A256GCMKW`)
//!
//! Wrapping encrypts the CEK under the recipient's key with AES GCM and
//! emits the `iv` and `tag` header parameters ([section 4.7 of RFC 7518])
//! into the recipient's unprotected header; unwrapping consumes them from
//! the merged header view.
//!
//! [section 4.7 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7>

use serde_json::Value;

use super::{
    aes_gcm::{open_variant, seal_variant},
    generate_iv, Cek, Error, ExtraHeaders, KeyManagementMode, Result, WrappedCek,
};
use crate::{
    base64_url::Base64UrlString,
    header::JweHeader,
    jwa::{AesGcm, KeyManagementAlgorithm},
    jwk::JsonWebKey,
};

const IV_SIZE: usize = 12;

/// The AES GCM key wrapping family, parameterized by key size.
#[derive(Debug, Clone, Copy)]
pub struct AesGcmKeyWrap {
    variant: AesGcm,
}

impl AesGcmKeyWrap {
    /// Creates the key wrapping algorithm for the given variant.
    pub const fn new(variant: AesGcm) -> Self {
        Self { variant }
    }
}

impl super::KeyManagement for AesGcmKeyWrap {
    fn name(&self) -> KeyManagementAlgorithm {
        KeyManagementAlgorithm::AesGcmKw(self.variant)
    }

    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyEncryption
    }

    fn wrap_cek(&self, key: &JsonWebKey, cek: &Cek, _merged: &JweHeader) -> Result<WrappedCek> {
        let kek = key.octets().ok_or(Error::new())?;
        if kek.len() != self.variant.key_size() {
            return Err(Error::new());
        }

        let iv = generate_iv(IV_SIZE)?;
        let sealed = seal_variant(self.variant, kek, &iv, cek.bytes(), b"")?;

        let mut extra_headers = ExtraHeaders::new();
        extra_headers.insert(
            "iv".into(),
            Value::String(Base64UrlString::encode(&iv).into_inner()),
        );
        extra_headers.insert(
            "tag".into(),
            Value::String(Base64UrlString::encode(&sealed.tag).into_inner()),
        );

        Ok(WrappedCek {
            encrypted_key: sealed.ciphertext,
            extra_headers,
        })
    }

    fn unwrap_cek(
        &self,
        key: &JsonWebKey,
        encrypted_key: &[u8],
        merged: &JweHeader,
    ) -> Result<Cek> {
        let kek = key.octets().ok_or(Error::new())?;
        if kek.len() != self.variant.key_size() {
            return Err(Error::new());
        }

        let iv = merged.bytes_param("iv").ok_or(Error::new())?;
        let tag = merged.bytes_param("tag").ok_or(Error::new())?;

        open_variant(self.variant, kek, &iv, encrypted_key, &tag, b"").map(Cek::new)
    }
}
