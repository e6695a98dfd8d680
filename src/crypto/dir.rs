//! Direct encryption (`dir`): the shared symmetric key *is* the CEK

use super::{AgreedCek, Cek, Error, ExtraHeaders, KeyManagementMode, Result};
use crate::{header::JweHeader, jwa::KeyManagementAlgorithm, jwk::JsonWebKey};

/// Direct use of a shared symmetric key as the CEK.
///
/// No wrapping happens; the recipient's encrypted key stays empty and the
/// key material must have exactly the size the content encryption
/// algorithm requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl super::KeyManagement for Direct {
    fn name(&self) -> KeyManagementAlgorithm {
        KeyManagementAlgorithm::Direct
    }

    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::DirectEncryption
    }

    fn derive_cek(
        &self,
        key: &JsonWebKey,
        cek_len: usize,
        _merged: &JweHeader,
    ) -> Result<AgreedCek> {
        let octets = key.octets().ok_or(Error::new())?;
        if octets.len() != cek_len {
            return Err(Error::new());
        }

        Ok(AgreedCek {
            cek: Cek::new(octets.to_vec()),
            extra_headers: ExtraHeaders::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyManagement as _;

    #[test]
    fn the_key_is_the_cek() {
        let key = JsonWebKey::octet_sequence(&[7u8; 16]);
        let agreed = Direct.derive_cek(&key, 16, &JweHeader::new()).unwrap();
        assert_eq!(agreed.cek.bytes(), &[7u8; 16]);
        assert!(agreed.extra_headers.is_empty());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let key = JsonWebKey::octet_sequence(&[7u8; 16]);
        assert!(Direct.derive_cek(&key, 32, &JweHeader::new()).is_err());
    }
}
