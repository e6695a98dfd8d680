//! The algorithm registry: every algorithm an operation may use, by name
//!
//! A [`AlgorithmRegistry`] maps algorithm identifiers to implementations.
//! Builders and decrypters borrow a registry and can only ever reach the
//! algorithms inside it, so [`restrict_to`](AlgorithmRegistry::restrict_to)
//! doubles as the allowlist mechanism: deriving a narrow registry per
//! operation is a deliberate anti-downgrade control, not just a lookup
//! convenience.
//!
//! There is no process-wide registry. A registry value is constructed once
//! and passed by reference into every operation.

use alloc::{
    string::{String, ToString},
    sync::Arc,
};
use core::fmt;

use hashbrown::HashMap;

use crate::{
    crypto::{
        aes_gcm::AesGcmEncryption, aes_gcm_kw::AesGcmKeyWrap, aes_kw::AesKeyWrap, dir::Direct,
        ecdh_es::EcdhEs, ContentEncryption, KeyManagement,
    },
    jwa::{
        AesGcm, AesKw, CompressionAlgorithm, ContentEncryptionAlgorithm, EcDhES,
        KeyManagementAlgorithm,
    },
    jwe::ConfigError,
    zip::Compression,
};

/// Maps algorithm identifiers to implementations.
///
/// Resolution is a case-sensitive exact match against the identifier each
/// implementation reports as its `name()`.
#[derive(Default, Clone)]
pub struct AlgorithmRegistry {
    key_management: HashMap<String, Arc<dyn KeyManagement>>,
    content_encryption: HashMap<String, Arc<dyn ContentEncryption>>,
    compression: HashMap<String, Arc<dyn Compression>>,
}

impl AlgorithmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in algorithm.
    ///
    /// Key management: `dir`, `A128KW`, `A192KW`, `A256KW`, `A128GCMKW`,
    /// `A192GCMKW`, `A256GCMKW`, `ECDH-ES`, `ECDH-ES+A128KW`,
    /// `ECDH-ES+A192KW`, `ECDH-ES+A256KW`. Content encryption: `A128GCM`,
    /// `A192GCM`, `A256GCM`. Compression: `DEF` (only with the `zip`
    /// feature).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_key_management(Arc::new(Direct));
        for variant in [AesKw::Aes128, AesKw::Aes192, AesKw::Aes256] {
            registry.register_key_management(Arc::new(AesKeyWrap::new(variant)));
            registry.register_key_management(Arc::new(EcdhEs::new(EcDhES::AesKw(variant))));
        }
        for variant in [AesGcm::Aes128, AesGcm::Aes192, AesGcm::Aes256] {
            registry.register_key_management(Arc::new(AesGcmKeyWrap::new(variant)));
            registry.register_content_encryption(Arc::new(AesGcmEncryption::new(variant)));
        }
        registry.register_key_management(Arc::new(EcdhEs::new(EcDhES::Direct)));

        #[cfg(feature = "zip")]
        registry.register_compression(Arc::new(crate::zip::Deflate));

        registry
    }

    /// Registers a key management algorithm under the name it reports.
    pub fn register_key_management(&mut self, alg: Arc<dyn KeyManagement>) {
        self.key_management.insert(alg.name().to_string(), alg);
    }

    /// Registers a content encryption algorithm under the name it reports.
    pub fn register_content_encryption(&mut self, enc: Arc<dyn ContentEncryption>) {
        self.content_encryption.insert(enc.name().to_string(), enc);
    }

    /// Registers a compression method under the name it reports.
    pub fn register_compression(&mut self, zip: Arc<dyn Compression>) {
        self.compression.insert(zip.name().to_string(), zip);
    }

    /// Resolves a key management algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedAlgorithm`] if the identifier is
    /// not present in this registry, whether it is unknown altogether or
    /// merely outside the allowlist this registry represents.
    pub fn resolve_key_management(
        &self,
        alg: &KeyManagementAlgorithm,
    ) -> Result<Arc<dyn KeyManagement>, ConfigError> {
        self.key_management
            .get(&alg.to_string())
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedAlgorithm(alg.to_string()))
    }

    /// Resolves a content encryption algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedAlgorithm`] if the identifier is
    /// not present in this registry.
    pub fn resolve_content_encryption(
        &self,
        enc: &ContentEncryptionAlgorithm,
    ) -> Result<Arc<dyn ContentEncryption>, ConfigError> {
        self.content_encryption
            .get(&enc.to_string())
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedAlgorithm(enc.to_string()))
    }

    /// Resolves a compression method.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedCompression`] if the identifier is
    /// not present in this registry.
    pub fn resolve_compression(
        &self,
        zip: &CompressionAlgorithm,
    ) -> Result<Arc<dyn Compression>, ConfigError> {
        self.compression
            .get(&zip.to_string())
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedCompression(zip.to_string()))
    }

    /// Derives a registry containing exactly the named algorithms.
    ///
    /// Every builder or decrypter constructed over the derived registry can
    /// reach only this allowlist.
    ///
    /// # Errors
    ///
    /// Fails if any named identifier is not present in `self`; an allowlist
    /// naming an unavailable algorithm is a configuration error in its own
    /// right.
    pub fn restrict_to(
        &self,
        algs: &[&str],
        encs: &[&str],
        zips: &[&str],
    ) -> Result<Self, ConfigError> {
        let mut restricted = Self::new();

        for &alg in algs {
            let implementation = self
                .key_management
                .get(alg)
                .ok_or_else(|| ConfigError::UnsupportedAlgorithm(alg.to_string()))?;
            restricted
                .key_management
                .insert(alg.to_string(), Arc::clone(implementation));
        }

        for &enc in encs {
            let implementation = self
                .content_encryption
                .get(enc)
                .ok_or_else(|| ConfigError::UnsupportedAlgorithm(enc.to_string()))?;
            restricted
                .content_encryption
                .insert(enc.to_string(), Arc::clone(implementation));
        }

        for &zip in zips {
            let implementation = self
                .compression
                .get(zip)
                .ok_or_else(|| ConfigError::UnsupportedCompression(zip.to_string()))?;
            restricted
                .compression
                .insert(zip.to_string(), Arc::clone(implementation));
        }

        Ok(restricted)
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field(
                "key_management",
                &self.key_management.keys().collect::<alloc::vec::Vec<_>>(),
            )
            .field(
                "content_encryption",
                &self
                    .content_encryption
                    .keys()
                    .collect::<alloc::vec::Vec<_>>(),
            )
            .field(
                "compression",
                &self.compression.keys().collect::<alloc::vec::Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_case_sensitive_and_exact() {
        let registry = AlgorithmRegistry::with_defaults();

        assert!(registry
            .resolve_key_management(&KeyManagementAlgorithm::Direct)
            .is_ok());
        assert!(matches!(
            registry
                .resolve_key_management(&KeyManagementAlgorithm::Other("DIR".into()))
                .unwrap_err(),
            ConfigError::UnsupportedAlgorithm(name) if name == "DIR"
        ));
    }

    #[test]
    fn restrict_to_filters_out_everything_unnamed() {
        let registry = AlgorithmRegistry::with_defaults()
            .restrict_to(&["dir"], &["A128GCM"], &[])
            .unwrap();

        assert!(registry
            .resolve_key_management(&KeyManagementAlgorithm::Direct)
            .is_ok());
        assert!(registry
            .resolve_key_management(&KeyManagementAlgorithm::AesKw(AesKw::Aes128))
            .is_err());
        assert!(registry
            .resolve_content_encryption(&ContentEncryptionAlgorithm::AesGcm(AesGcm::Aes256))
            .is_err());
    }

    #[test]
    fn restricting_to_an_unknown_name_is_an_error() {
        let registry = AlgorithmRegistry::with_defaults();
        assert!(registry.restrict_to(&["RSA-OAEP"], &[], &[]).is_err());
    }
}
