//! Building (encrypting) a JWE

use alloc::{sync::Arc, vec::Vec};

use super::{ConfigError, JsonWebEncryption, Recipient};
use crate::{
    base64_url::Base64UrlString,
    crypto::{self, Cek, ContentEncryption as _, ExtraHeaders, KeyManagement, KeyManagementMode},
    header::JweHeader,
    jwa::{ContentEncryptionAlgorithm, KeyAlgorithm, KeyManagementAlgorithm},
    jwk::{JsonWebKey, KeyOperation, KeyUsage},
    registry::AlgorithmRegistry,
    zip::Compression as _,
};

/// Builds a [`JsonWebEncryption`] from a payload, headers and one or more
/// recipients.
///
/// A builder borrows its [`AlgorithmRegistry`] and the recipient keys for
/// the duration of one operation; [`build`](Self::build) consumes the
/// builder, so a fresh one is required per JWE. The builder holds no
/// state between operations and separate builders never share anything
/// mutable, so concurrent builds are safe without locking.
///
/// Algorithm selection is entirely header-driven: set `alg` (per recipient
/// or shared) and `enc` (shared) in the headers you pass in, and put a
/// `zip` parameter into the shared headers if the payload should be
/// compressed.
#[derive(Debug)]
pub struct JweBuilder<'a> {
    registry: &'a AlgorithmRegistry,
    payload: Option<Vec<u8>>,
    protected: JweHeader,
    unprotected: JweHeader,
    aad: Option<Vec<u8>>,
    recipients: Vec<(&'a JsonWebKey, JweHeader)>,
}

impl<'a> JweBuilder<'a> {
    /// Creates a builder that can reach exactly the algorithms in
    /// `registry`.
    pub fn new(registry: &'a AlgorithmRegistry) -> Self {
        Self {
            registry,
            payload: None,
            protected: JweHeader::new(),
            unprotected: JweHeader::new(),
            aad: None,
            recipients: Vec::new(),
        }
    }

    /// Sets the payload to encrypt.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Sets the shared protected header.
    ///
    /// These parameters are integrity protected: the serialized header is
    /// part of the additional authenticated data, and once the JWE is
    /// built any change to it invalidates the authentication tag.
    #[must_use]
    pub fn protected_header(mut self, header: JweHeader) -> Self {
        self.protected = header;
        self
    }

    /// Sets the shared unprotected header.
    #[must_use]
    pub fn unprotected_header(mut self, header: JweHeader) -> Self {
        self.unprotected = header;
        self
    }

    /// Attaches external additional authenticated data.
    ///
    /// The data is integrity protected but not encrypted, and is only
    /// representable in the JSON serializations.
    #[must_use]
    pub fn external_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.aad = Some(aad.into());
        self
    }

    /// Adds a recipient addressed by `key`, with no per-recipient header.
    #[must_use]
    pub fn add_recipient(self, key: &'a JsonWebKey) -> Self {
        self.add_recipient_with_header(key, JweHeader::new())
    }

    /// Adds a recipient addressed by `key` with its own unprotected header.
    ///
    /// Parameters emitted by the recipient's key management algorithm
    /// (e.g. `epk`, or the `iv`/`tag` of AES GCM key wrapping) are merged
    /// into this header during [`build`](Self::build).
    #[must_use]
    pub fn add_recipient_with_header(mut self, key: &'a JsonWebKey, header: JweHeader) -> Self {
        self.recipients.push((key, header));
        self
    }

    /// Encrypts the payload and assembles the JWE.
    ///
    /// A fail-fast validation pass (payload and recipients present, all
    /// algorithms resolvable within the registry's allowlist, key usage,
    /// direct-mode arity and key sizes) runs to completion before any
    /// cryptographic work starts.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first validation failure,
    /// or the (opaque) cryptographic error if a later stage fails.
    pub fn build(self) -> Result<JsonWebEncryption, ConfigError> {
        let payload = self.payload.ok_or(ConfigError::MissingPayload)?;
        if self.recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }

        // Validation pass. Everything the operation needs is resolved and
        // checked here; no CEK exists yet.
        let mut enc_alg: Option<ContentEncryptionAlgorithm> = None;
        let mut planned: Vec<(KeyManagementAlgorithm, Arc<dyn KeyManagement>, JweHeader)> =
            Vec::with_capacity(self.recipients.len());
        let mut direct: Option<usize> = None;

        for (index, (_, header)) in self.recipients.iter().enumerate() {
            let merged = JweHeader::merged(&self.protected, &self.unprotected, header);

            let this_enc = merged
                .content_encryption()
                .ok_or(ConfigError::MissingHeader("enc"))?;
            match &enc_alg {
                None => enc_alg = Some(this_enc),
                Some(previous) if *previous != this_enc => {
                    return Err(ConfigError::ContentEncryptionMismatch)
                }
                Some(_) => {}
            }

            let alg = merged
                .algorithm()
                .ok_or(ConfigError::MissingHeader("alg"))?;
            let implementation = self.registry.resolve_key_management(&alg)?;

            if implementation.mode().is_direct() && direct.replace(index).is_some() {
                return Err(ConfigError::DirectModeConflict);
            }

            planned.push((alg, implementation, merged));
        }

        let enc_alg = enc_alg.ok_or(ConfigError::MissingHeader("enc"))?;
        let enc = self.registry.resolve_content_encryption(&enc_alg)?;

        let zip = match self
            .protected
            .compression()
            .or_else(|| self.unprotected.compression())
        {
            Some(method) => Some(self.registry.resolve_compression(&method)?),
            None => None,
        };

        for (index, (key, _)) in self.recipients.iter().enumerate() {
            let (alg, implementation, _) = &planned[index];

            check_key_usage(key, wrap_side_operation(implementation.mode()), alg, &enc_alg)?;

            // A direct key must already have the size `enc` requires; this
            // is a configuration error, not a cryptographic one, and fails
            // before any recipient is processed.
            if implementation.mode() == KeyManagementMode::DirectEncryption {
                let found = key.octets().map_or(0, <[u8]>::len);
                if found != enc.key_size() {
                    return Err(ConfigError::InvalidKeyLength {
                        expected: enc.key_size(),
                        found,
                    });
                }
            }
        }

        // Stateful pass. Determine the CEK: exactly one direct recipient
        // may supply or agree it, otherwise it is freshly generated.
        let mut direct_extra: Option<ExtraHeaders> = None;
        let cek = match direct {
            Some(index) => {
                let (_, implementation, merged) = &planned[index];
                let (key, _) = &self.recipients[index];
                let agreed = implementation
                    .derive_cek(key, enc.key_size(), merged)
                    .map_err(ConfigError::Crypto)?;
                direct_extra = Some(agreed.extra_headers);
                agreed.cek
            }
            None => Cek::generate(enc.key_size()).map_err(ConfigError::Crypto)?,
        };

        let mut recipients = Vec::with_capacity(self.recipients.len());
        for (index, (key, header)) in self.recipients.iter().enumerate() {
            let (_, implementation, merged) = &planned[index];
            let mut header = header.clone();

            let encrypted_key = if direct == Some(index) {
                header.extend(direct_extra.take().unwrap_or_default());
                Vec::new()
            } else {
                let wrapped = implementation
                    .wrap_cek(key, &cek, merged)
                    .map_err(ConfigError::Crypto)?;
                header.extend(wrapped.extra_headers);
                wrapped.encrypted_key
            };

            recipients.push(Recipient::new(header, encrypted_key));
        }

        let plaintext = match &zip {
            Some(method) => method
                .compress(&payload)
                .map_err(|_| ConfigError::Compression)?,
            None => payload,
        };

        let encoded_protected = if self.protected.is_empty() {
            Base64UrlString::new()
        } else {
            let json = serde_json::to_vec(&self.protected).map_err(ConfigError::SerializeHeader)?;
            Base64UrlString::encode(json)
        };

        let mut aad = encoded_protected.as_bytes().to_vec();
        if let Some(external) = &self.aad {
            aad.push(b'.');
            aad.extend_from_slice(Base64UrlString::encode(external).as_bytes());
        }

        let iv = crypto::generate_iv(enc.iv_size()).map_err(ConfigError::Crypto)?;
        let sealed = enc
            .encrypt(cek.bytes(), &iv, &plaintext, &aad)
            .map_err(ConfigError::Crypto)?;

        // The CEK is dropped (and wiped) here.
        Ok(JsonWebEncryption::from_parts(
            self.protected,
            encoded_protected,
            self.unprotected,
            recipients,
            iv,
            sealed.ciphertext,
            sealed.tag,
            self.aad,
        ))
    }
}

/// The key operation the wrapping side of `mode` performs.
pub(crate) const fn wrap_side_operation(mode: KeyManagementMode) -> KeyOperation {
    match mode {
        KeyManagementMode::DirectEncryption => KeyOperation::Encrypt,
        KeyManagementMode::KeyEncryption => KeyOperation::WrapKey,
        KeyManagementMode::DirectKeyAgreement
        | KeyManagementMode::KeyAgreementWithKeyWrapping => KeyOperation::DeriveKey,
    }
}

/// The key operation the unwrapping side of `mode` performs.
pub(crate) const fn unwrap_side_operation(mode: KeyManagementMode) -> KeyOperation {
    match mode {
        KeyManagementMode::DirectEncryption => KeyOperation::Decrypt,
        KeyManagementMode::KeyEncryption => KeyOperation::UnwrapKey,
        KeyManagementMode::DirectKeyAgreement
        | KeyManagementMode::KeyAgreementWithKeyWrapping => KeyOperation::DeriveKey,
    }
}

/// Enforces the key's declared metadata against the attempted operation,
/// before any algorithm runs.
pub(crate) fn check_key_usage(
    key: &JsonWebKey,
    operation: KeyOperation,
    alg: &KeyManagementAlgorithm,
    enc: &ContentEncryptionAlgorithm,
) -> Result<(), ConfigError> {
    match key.key_use() {
        None | Some(KeyUsage::Encryption) => {}
        Some(_) => {
            return Err(ConfigError::KeyUsageViolation(
                "the key is not intended for encryption",
            ))
        }
    }

    if let Some(operations) = key.key_operations() {
        if !operations.contains(&operation) {
            return Err(ConfigError::KeyUsageViolation(
                "the key's operations do not permit this operation",
            ));
        }
    }

    // A key restricted to one algorithm may name either the key management
    // algorithm it transports CEKs with or, for direct keys, the content
    // encryption algorithm it is used as the CEK of.
    if let Some(restriction) = key.algorithm() {
        let permitted = match restriction {
            KeyAlgorithm::KeyManagement(allowed) => allowed == alg,
            KeyAlgorithm::ContentEncryption(allowed) => allowed == enc,
            _ => false,
        };
        if !permitted {
            return Err(ConfigError::KeyUsageViolation(
                "the key is restricted to a different algorithm",
            ));
        }
    }

    Ok(())
}
