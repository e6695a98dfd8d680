//! Implementation of the JSON Web Algorithms (JWA) relevant for encryption
//! as defined in [RFC 7518]
//!
//! [RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518>

mod aes_gcm;
mod aes_kw;
mod ecdh_es;

use alloc::{borrow::Cow, string::String};

use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{aes_gcm::AesGcm, aes_kw::AesKw, ecdh_es::EcDhES};

/// A JSON Web Algorithm (JWA) for management of the Content Encryption Key
/// (CEK) as defined in [RFC 7518 section 4]
///
/// This enum covers the `alg` Header Parameter Values for JWE. It represents
/// the table from [section 4.1].
///
/// [RFC 7518 section 4]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4>
/// [section 4.1]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.1>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyManagementAlgorithm {
    /// Direct use of a shared symmetric key as the CEK as defined in [section
    /// 4.5]
    ///
    /// [section 4.5]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.5>
    Direct,
    /// AES Key Wrap
    AesKw(AesKw),
    /// Key wrapping with AES GCM
    AesGcmKw(AesGcm),
    /// Elliptic Curve Diffie-Hellman Ephemeral Static (ECDH-ES)
    EcDhES(EcDhES),
    /// JSON Web Algorithms that are not recognised by this implementation.
    ///
    /// If you want to register a custom
    /// [`KeyManagement`](crate::crypto::KeyManagement) implementation, use
    /// this variant to identify your algorithm.
    Other(String),
}

impl_serde_jwa!(
    KeyManagementAlgorithm,
    [
        "dir" => Self::Direct; Self::Direct,

        "A128KW" => Self::AesKw(AesKw::Aes128); Self::AesKw(AesKw::Aes128),
        "A192KW" => Self::AesKw(AesKw::Aes192); Self::AesKw(AesKw::Aes192),
        "A256KW" => Self::AesKw(AesKw::Aes256); Self::AesKw(AesKw::Aes256),

        "A128GCMKW" => Self::AesGcmKw(AesGcm::Aes128); Self::AesGcmKw(AesGcm::Aes128),
        "A192GCMKW" => Self::AesGcmKw(AesGcm::Aes192); Self::AesGcmKw(AesGcm::Aes192),
        "A256GCMKW" => Self::AesGcmKw(AesGcm::Aes256); Self::AesGcmKw(AesGcm::Aes256),

        "ECDH-ES" => Self::EcDhES(EcDhES::Direct); Self::EcDhES(EcDhES::Direct),
        "ECDH-ES+A128KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes128)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes128)),
        "ECDH-ES+A192KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes192)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes192)),
        "ECDH-ES+A256KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes256)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes256)),
    ]
);

/// A JSON Web Algorithm (JWA) for content encryption and decryption of a JWE
/// as defined in [RFC 7518 section 5]
///
/// This enum covers the `enc` Header Parameter Values for JWE. It represents
/// the table from [section 5.1].
///
/// [RFC 7518 section 5]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5>
/// [section 5.1]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.1>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ContentEncryptionAlgorithm {
    /// Content Encryption using AES GCM
    AesGcm(AesGcm),
    /// JSON Web Algorithms that are not recognised by this implementation.
    ///
    /// Use this variant if you want to register a custom
    /// [`ContentEncryption`](crate::crypto::ContentEncryption)
    /// implementation.
    Other(String),
}

impl_serde_jwa!(
    ContentEncryptionAlgorithm,
    [
        "A128GCM" => Self::AesGcm(AesGcm::Aes128); Self::AesGcm(AesGcm::Aes128),
        "A192GCM" => Self::AesGcm(AesGcm::Aes192); Self::AesGcm(AesGcm::Aes192),
        "A256GCM" => Self::AesGcm(AesGcm::Aes256); Self::AesGcm(AesGcm::Aes256),
    ]
);

/// The compression algorithm applied to the plaintext before encryption, as
/// carried in the `zip` Header Parameter ([RFC 7516 section 4.1.3]).
///
/// [RFC 7516 section 4.1.3]: <https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.3>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CompressionAlgorithm {
    /// DEFLATE ([RFC 1951])
    ///
    /// [RFC 1951]: <https://datatracker.ietf.org/doc/html/rfc1951>
    Deflate,
    /// Compression methods that are not recognised by this implementation.
    Other(String),
}

impl_serde_jwa!(
    CompressionAlgorithm,
    [
        "DEF" => Self::Deflate; Self::Deflate,
    ]
);

/// The algorithm a [`JsonWebKey`](crate::jwk::JsonWebKey) is restricted to
/// via its `alg` parameter.
///
/// A key used for encryption may name either the key management algorithm it
/// wraps CEKs with (e.g. `A128KW`) or, for keys used directly as the CEK,
/// the content encryption algorithm (e.g. `A128GCM`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyAlgorithm {
    /// A key management (`alg`) algorithm.
    KeyManagement(KeyManagementAlgorithm),
    /// A content encryption (`enc`) algorithm.
    ContentEncryption(ContentEncryptionAlgorithm),
    /// An algorithm identifier not recognised by this implementation.
    Other(String),
}

impl core::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::KeyManagement(alg) => core::fmt::Display::fmt(alg, f),
            Self::ContentEncryption(enc) => core::fmt::Display::fmt(enc, f),
            Self::Other(other) => f.write_str(other),
        }
    }
}

impl Serialize for KeyAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let val = <Cow<'_, str> as Deserialize>::deserialize(deserializer)?;

        if let Some(alg) = KeyManagementAlgorithm::from_str_without_other(&val) {
            return Ok(Self::KeyManagement(alg));
        }

        if let Some(enc) = ContentEncryptionAlgorithm::from_str_without_other(&val) {
            return Ok(Self::ContentEncryption(enc));
        }

        Ok(Self::Other(val.into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn identifiers_round_trip() {
        for (name, alg) in [
            ("dir", KeyManagementAlgorithm::Direct),
            (
                "A256KW",
                KeyManagementAlgorithm::AesKw(AesKw::Aes256),
            ),
            (
                "ECDH-ES+A128KW",
                KeyManagementAlgorithm::EcDhES(EcDhES::AesKw(AesKw::Aes128)),
            ),
        ] {
            let parsed: KeyManagementAlgorithm =
                serde_json::from_value(serde_json::Value::String(name.to_string())).unwrap();
            assert_eq!(parsed, alg);
            assert_eq!(alg.to_string(), name);
        }
    }

    #[test]
    fn unknown_identifier_passes_through() {
        let parsed: ContentEncryptionAlgorithm =
            serde_json::from_value(serde_json::Value::String("A128CBC-HS256".to_string()))
                .unwrap();
        assert_eq!(
            parsed,
            ContentEncryptionAlgorithm::Other("A128CBC-HS256".to_string())
        );
    }

    #[test]
    fn key_algorithm_covers_both_families() {
        let dir: KeyAlgorithm =
            serde_json::from_value(serde_json::Value::String("dir".to_string())).unwrap();
        assert_eq!(
            dir,
            KeyAlgorithm::KeyManagement(KeyManagementAlgorithm::Direct)
        );

        let gcm: KeyAlgorithm =
            serde_json::from_value(serde_json::Value::String("A128GCM".to_string())).unwrap();
        assert_eq!(
            gcm,
            KeyAlgorithm::ContentEncryption(ContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128))
        );
    }
}
