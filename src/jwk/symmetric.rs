//! Symmetric key material for JWE

use alloc::{string::String, vec::Vec};

use serde::{de::Error, Deserialize, Deserializer, Serialize};

use crate::base64_url::Base64UrlBytes;

/// An octet sequence (`kty` of `oct`) as defined in
/// <https://datatracker.ietf.org/doc/html/rfc7518#section-6.4.1>
///
/// Depending on the key management algorithm, the octets serve as the CEK
/// itself (`dir`) or as the key encryption key (`A*KW`, `A*GCMKW`).
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct OctetSequence(Base64UrlBytes);

impl OctetSequence {
    /// Creates an octet sequence from the given raw key bytes.
    pub fn new(x: impl Into<Vec<u8>>) -> Self {
        Self(Base64UrlBytes(x.into()))
    }

    /// Returns the number of bytes that are in this octet sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    /// Returns `true` if this octet sequence has a length of zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw key bytes.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0 .0
    }
}

impl From<OctetSequence> for super::JsonWebKeyType {
    fn from(x: OctetSequence) -> Self {
        super::JsonWebKeyType::Symmetric(x)
    }
}

impl<'de> Deserialize<'de> for OctetSequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            kty: String,
            k: Base64UrlBytes,
        }

        let repr = Repr::deserialize(deserializer)?;
        if repr.kty != "oct" {
            return Err(D::Error::custom("`kty` field is required to be `oct`"));
        }

        Ok(Self(repr.k))
    }
}

impl Serialize for OctetSequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Repr<'a> {
            kty: &'static str,
            k: &'a Base64UrlBytes,
        }
        Repr {
            kty: "oct",
            k: &self.0,
        }
        .serialize(serializer)
    }
}
