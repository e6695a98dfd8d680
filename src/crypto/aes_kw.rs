//! Key wrapping with AES Key Wrap (`A128KW`, `A192KW`, `A256KW`)

use alloc::vec::Vec;

use aes_kw::{KekAes128, KekAes192, KekAes256};

use super::{Cek, Error, KeyManagementMode, Result, WrappedCek};
use crate::{
    crypto::ExtraHeaders,
    header::JweHeader,
    jwa::{AesKw, KeyManagementAlgorithm},
    jwk::JsonWebKey,
};

/// The AES Key Wrap family ([RFC 3394]), parameterized by the size of the
/// key encryption key.
///
/// [RFC 3394]: <https://datatracker.ietf.org/doc/html/rfc3394>
#[derive(Debug, Clone, Copy)]
pub struct AesKeyWrap {
    variant: AesKw,
}

impl AesKeyWrap {
    /// Creates the key wrapping algorithm for the given variant.
    pub const fn new(variant: AesKw) -> Self {
        Self { variant }
    }
}

impl super::KeyManagement for AesKeyWrap {
    fn name(&self) -> KeyManagementAlgorithm {
        KeyManagementAlgorithm::AesKw(self.variant)
    }

    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::KeyEncryption
    }

    fn wrap_cek(&self, key: &JsonWebKey, cek: &Cek, _merged: &JweHeader) -> Result<WrappedCek> {
        let kek = key.octets().ok_or(Error::new())?;

        Ok(WrappedCek {
            encrypted_key: wrap_with(self.variant, kek, cek.bytes())?,
            extra_headers: ExtraHeaders::new(),
        })
    }

    fn unwrap_cek(
        &self,
        key: &JsonWebKey,
        encrypted_key: &[u8],
        _merged: &JweHeader,
    ) -> Result<Cek> {
        let kek = key.octets().ok_or(Error::new())?;

        unwrap_with(self.variant, kek, encrypted_key).map(Cek::new)
    }
}

pub(crate) fn wrap_with(variant: AesKw, kek: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if kek.len() != variant.key_size() {
        return Err(Error::new());
    }

    match variant {
        AesKw::Aes128 => {
            let kek: [u8; 16] = kek.try_into().map_err(|_| Error::new())?;
            KekAes128::from(kek).wrap_vec(data)
        }
        AesKw::Aes192 => {
            let kek: [u8; 24] = kek.try_into().map_err(|_| Error::new())?;
            KekAes192::from(kek).wrap_vec(data)
        }
        AesKw::Aes256 => {
            let kek: [u8; 32] = kek.try_into().map_err(|_| Error::new())?;
            KekAes256::from(kek).wrap_vec(data)
        }
    }
    .map_err(|_| Error::new())
}

pub(crate) fn unwrap_with(variant: AesKw, kek: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if kek.len() != variant.key_size() {
        return Err(Error::new());
    }

    match variant {
        AesKw::Aes128 => {
            let kek: [u8; 16] = kek.try_into().map_err(|_| Error::new())?;
            KekAes128::from(kek).unwrap_vec(data)
        }
        AesKw::Aes192 => {
            let kek: [u8; 24] = kek.try_into().map_err(|_| Error::new())?;
            KekAes192::from(kek).unwrap_vec(data)
        }
        AesKw::Aes256 => {
            let kek: [u8; 32] = kek.try_into().map_err(|_| Error::new())?;
            KekAes256::from(kek).unwrap_vec(data)
        }
    }
    .map_err(|_| Error::new())
}
