//! Loading (decrypting) a JWE

use alloc::{sync::Arc, vec::Vec};

use super::{
    builder::{check_key_usage, unwrap_side_operation},
    ConfigError, DecryptError, DecryptionFailed, JsonWebEncryption, Recipient,
};
use crate::{
    crypto::{Cek, ContentEncryption as _, KeyManagement as _, KeyManagementMode},
    jwk::JsonWebKey,
    registry::AlgorithmRegistry,
    zip::Compression,
};

/// Recovers the plaintext of a [`JsonWebEncryption`].
///
/// A decrypter borrows its [`AlgorithmRegistry`] and holds no other state;
/// every call is independent and concurrent use needs no locking.
///
/// Failure reporting is two-tiered by design: mistakes in the caller's own
/// configuration (disallowed algorithms, key usage violations) surface as
/// precise [`ConfigError`]s before any cryptographic work, while everything
/// that happens once secret data is involved — unwrapping, tag
/// verification, decompression — collapses into the single opaque
/// [`DecryptionFailed`]. A wrong key never looks different from a wrong
/// guess.
#[derive(Debug)]
pub struct JweDecrypter<'a> {
    registry: &'a AlgorithmRegistry,
}

/// Why one recipient attempt did not produce a plaintext.
enum Attempt {
    /// Rejected before cryptography; precise and safe to surface.
    Config(ConfigError),
    /// Failed during cryptography; deliberately reason-free.
    Failed,
}

impl From<ConfigError> for Attempt {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl<'a> JweDecrypter<'a> {
    /// Creates a decrypter that can reach exactly the algorithms in
    /// `registry`.
    pub const fn new(registry: &'a AlgorithmRegistry) -> Self {
        Self { registry }
    }

    /// Tries to decrypt `jwe` with `key`, attempting every recipient in
    /// order until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError::Failed`] if any recipient reached
    /// cryptographic work and none succeeded. Only if every recipient was
    /// rejected beforehand is the first [`ConfigError`] returned instead.
    pub fn decrypt(
        &self,
        jwe: &JsonWebEncryption,
        key: &JsonWebKey,
    ) -> Result<Vec<u8>, DecryptError> {
        self.try_recipients(jwe, key, jwe.recipients())
    }

    /// Tries to decrypt `jwe` with `key` for the recipient at `index`
    /// only.
    ///
    /// # Errors
    ///
    /// As [`decrypt`](Self::decrypt); an out-of-range index is a
    /// [`ConfigError`].
    pub fn decrypt_recipient(
        &self,
        jwe: &JsonWebEncryption,
        key: &JsonWebKey,
        index: usize,
    ) -> Result<Vec<u8>, DecryptError> {
        let recipient = jwe
            .recipients()
            .get(index..=index)
            .ok_or(ConfigError::RecipientIndex(index))?;
        self.try_recipients(jwe, key, recipient)
    }

    /// Tries to decrypt `jwe` with each of `keys` in order, the explicit
    /// key-selection loop for callers holding several candidate keys.
    ///
    /// # Errors
    ///
    /// As [`decrypt`](Self::decrypt), aggregated over all keys.
    pub fn decrypt_with_keys(
        &self,
        jwe: &JsonWebEncryption,
        keys: &[JsonWebKey],
    ) -> Result<Vec<u8>, DecryptError> {
        let mut config: Option<ConfigError> = None;
        let mut reached_crypto = false;

        for key in keys {
            match self.decrypt(jwe, key) {
                Ok(plaintext) => return Ok(plaintext),
                Err(DecryptError::Failed(_)) => reached_crypto = true,
                Err(DecryptError::Config(err)) => {
                    config.get_or_insert(err);
                }
            }
        }

        if reached_crypto {
            Err(DecryptionFailed.into())
        } else {
            Err(config.map_or(DecryptError::Failed(DecryptionFailed), DecryptError::Config))
        }
    }

    fn try_recipients(
        &self,
        jwe: &JsonWebEncryption,
        key: &JsonWebKey,
        recipients: &[Recipient],
    ) -> Result<Vec<u8>, DecryptError> {
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients.into());
        }

        let mut config: Option<ConfigError> = None;
        let mut reached_crypto = false;

        for recipient in recipients {
            match self.attempt(jwe, key, recipient) {
                Ok(plaintext) => return Ok(plaintext),
                Err(Attempt::Failed) => reached_crypto = true,
                Err(Attempt::Config(err)) => {
                    config.get_or_insert(err);
                }
            }
        }

        // The loader never reports which recipient failed, or why, beyond
        // the overall outcome.
        if reached_crypto {
            Err(DecryptionFailed.into())
        } else {
            Err(config.map_or(DecryptError::Failed(DecryptionFailed), DecryptError::Config))
        }
    }

    /// One recipient attempt: configuration checks first, cryptography
    /// after, with every post-configuration failure normalized.
    fn attempt(
        &self,
        jwe: &JsonWebEncryption,
        key: &JsonWebKey,
        recipient: &Recipient,
    ) -> Result<Vec<u8>, Attempt> {
        let merged = jwe.merged_header(recipient);

        let alg = merged
            .algorithm()
            .ok_or(ConfigError::MissingHeader("alg"))?;
        let enc_alg = merged
            .content_encryption()
            .ok_or(ConfigError::MissingHeader("enc"))?;

        let implementation = self.registry.resolve_key_management(&alg)?;
        let enc = self.registry.resolve_content_encryption(&enc_alg)?;

        let zip: Option<Arc<dyn Compression>> = match merged.compression() {
            Some(method) => Some(self.registry.resolve_compression(&method)?),
            None => None,
        };

        check_key_usage(key, unwrap_side_operation(implementation.mode()), &alg, &enc_alg)?;

        // A direct key of the wrong size is a configuration error and is
        // rejected before any cryptographic work, like in the builder.
        if implementation.mode() == KeyManagementMode::DirectEncryption {
            let found = key.octets().map_or(0, <[u8]>::len);
            if found != enc.key_size() {
                return Err(ConfigError::InvalidKeyLength {
                    expected: enc.key_size(),
                    found,
                }
                .into());
            }
        }

        // From here on, every failure is the same failure.
        let cek: Cek = if implementation.mode().is_direct() {
            if !recipient.encrypted_key().is_empty() {
                return Err(Attempt::Failed);
            }
            implementation
                .derive_cek(key, enc.key_size(), &merged)
                .map_err(|_| Attempt::Failed)?
                .cek
        } else {
            implementation
                .unwrap_cek(key, recipient.encrypted_key(), &merged)
                .map_err(|_| Attempt::Failed)?
        };

        if cek.len() != enc.key_size() {
            return Err(Attempt::Failed);
        }

        let aad = jwe.content_aad();
        let plaintext = enc
            .decrypt(cek.bytes(), jwe.iv(), jwe.ciphertext(), jwe.tag(), &aad)
            .map_err(|_| Attempt::Failed)?;

        match zip {
            Some(method) => method.decompress(&plaintext).map_err(|_| Attempt::Failed),
            None => Ok(plaintext),
        }
    }
}
