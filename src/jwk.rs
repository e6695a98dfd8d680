//! JSON Web Key (JWK) as defined in [RFC 7517], reduced to the key types
//! the encryption engine consumes
//!
//! A [`JsonWebKey`] is an opaque bag of attributes: the raw key material
//! plus the metadata that constrains how it may be used (`use`, `key_ops`,
//! `alg`, `kid`). Keys are immutable once constructed; the engine borrows
//! them for the duration of a single operation and never stores or logs
//! key material.
//!
//! Key-set storage and discovery are out of scope; callers materialize
//! their keys and hand them in.
//!
//! [RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517>

mod key_ops;
mod key_use;
mod okp;
mod symmetric;

use alloc::{string::String, vec::Vec};

use hashbrown::HashSet;
use serde::{de::Error as _, Deserialize, Serialize};

#[doc(inline)]
pub use self::{key_ops::KeyOperation, key_use::KeyUsage, okp::OkpKey, symmetric::OctetSequence};
use crate::{
    base64_url::{Base64UrlBytes, SecretBase64UrlBytes},
    jwa::KeyAlgorithm,
};

/// The cryptographic material of a [`JsonWebKey`], distinguished by the
/// `kty` parameter.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum JsonWebKeyType {
    /// An octet sequence (`kty` of `oct`)
    Symmetric(OctetSequence),
    /// An octet key pair on X25519 (`kty` of `OKP`)
    Okp(OkpKey),
}

/// A JSON Web Key as consumed by the encryption engine.
#[derive(Debug, Clone)]
pub struct JsonWebKey {
    key_type: JsonWebKeyType,
    key_use: Option<KeyUsage>,
    key_operations: Option<HashSet<KeyOperation>>,
    algorithm: Option<KeyAlgorithm>,
    key_id: Option<String>,
}

impl JsonWebKey {
    /// Creates a key from the given material, with no usage restrictions.
    pub fn new(key_type: impl Into<JsonWebKeyType>) -> Self {
        Self {
            key_type: key_type.into(),
            key_use: None,
            key_operations: None,
            algorithm: None,
            key_id: None,
        }
    }

    /// Creates a symmetric key from raw octets.
    pub fn octet_sequence(bytes: &[u8]) -> Self {
        Self::new(OctetSequence::new(bytes))
    }

    /// Restricts the intended use of this key.
    #[must_use]
    pub fn with_key_use(mut self, key_use: KeyUsage) -> Self {
        self.key_use = Some(key_use);
        self
    }

    /// Restricts the operations this key may perform.
    #[must_use]
    pub fn with_key_operations(
        mut self,
        key_operations: impl IntoIterator<Item = KeyOperation>,
    ) -> Self {
        self.key_operations = Some(key_operations.into_iter().collect());
        self
    }

    /// Restricts this key to a single algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Attaches a key id (`kid`) to this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// The cryptographic material of this key.
    pub const fn key_type(&self) -> &JsonWebKeyType {
        &self.key_type
    }

    /// The intended use (`use`) of this key, if declared.
    pub const fn key_use(&self) -> Option<&KeyUsage> {
        self.key_use.as_ref()
    }

    /// The permitted operations (`key_ops`) of this key, if declared.
    pub const fn key_operations(&self) -> Option<&HashSet<KeyOperation>> {
        self.key_operations.as_ref()
    }

    /// The algorithm (`alg`) this key is restricted to, if declared.
    pub const fn algorithm(&self) -> Option<&KeyAlgorithm> {
        self.algorithm.as_ref()
    }

    /// The key id (`kid`) of this key, if present.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// The raw octets of a symmetric key.
    pub(crate) fn octets(&self) -> Option<&[u8]> {
        match &self.key_type {
            JsonWebKeyType::Symmetric(seq) => Some(seq.as_bytes()),
            _ => None,
        }
    }

    /// The X25519 key pair, for the `ECDH-ES` family.
    pub(crate) fn okp(&self) -> Option<&OkpKey> {
        match &self.key_type {
            JsonWebKeyType::Okp(key) => Some(key),
            _ => None,
        }
    }
}

impl From<OctetSequence> for JsonWebKey {
    fn from(x: OctetSequence) -> Self {
        Self::new(x)
    }
}

impl From<OkpKey> for JsonWebKey {
    fn from(x: OkpKey) -> Self {
        Self::new(x)
    }
}

impl<'de> Deserialize<'de> for JsonWebKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            kty: String,
            #[serde(default)]
            k: Option<Base64UrlBytes>,
            #[serde(default)]
            crv: Option<String>,
            #[serde(default)]
            x: Option<Base64UrlBytes>,
            #[serde(default)]
            d: Option<SecretBase64UrlBytes>,
            #[serde(default, rename = "use")]
            key_use: Option<KeyUsage>,
            #[serde(default)]
            key_ops: Option<HashSet<KeyOperation>>,
            #[serde(default)]
            alg: Option<KeyAlgorithm>,
            #[serde(default)]
            kid: Option<String>,
        }

        let repr = Repr::deserialize(deserializer)?;

        let key_type = match &*repr.kty {
            "oct" => {
                let k = repr.k.ok_or_else(|| D::Error::missing_field("k"))?;
                JsonWebKeyType::Symmetric(OctetSequence::new(k.0))
            }
            "OKP" => {
                match repr.crv.as_deref() {
                    Some("X25519") => {}
                    Some(_) => return Err(D::Error::custom("unsupported `crv` for an OKP key")),
                    None => return Err(D::Error::missing_field("crv")),
                }

                let x = repr.x.ok_or_else(|| D::Error::missing_field("x"))?;
                let x: [u8; 32] = x
                    .0
                    .as_slice()
                    .try_into()
                    .map_err(|_| D::Error::custom("`x` must encode exactly 32 bytes"))?;

                match repr.d {
                    Some(d) => {
                        let mut scalar = [0u8; 32];
                        if d.expose().len() != 32 {
                            return Err(D::Error::custom("`d` must encode exactly 32 bytes"));
                        }
                        scalar.copy_from_slice(d.expose());

                        let key = OkpKey::from_secret(scalar);
                        scalar.fill(0);
                        if key.public_bytes() != x {
                            return Err(D::Error::custom(
                                "the `x` and `d` members are not a consistent key pair",
                            ));
                        }
                        JsonWebKeyType::Okp(key)
                    }
                    None => JsonWebKeyType::Okp(OkpKey::from_public(x)),
                }
            }
            _ => return Err(D::Error::custom("unsupported `kty`")),
        };

        Ok(Self {
            key_type,
            key_use: repr.key_use,
            key_operations: repr.key_ops,
            algorithm: repr.alg,
            key_id: repr.kid,
        })
    }
}

impl Serialize for JsonWebKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Repr<'a> {
            kty: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            k: Option<Base64UrlBytes>,
            #[serde(skip_serializing_if = "Option::is_none")]
            crv: Option<&'static str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            x: Option<Base64UrlBytes>,
            #[serde(skip_serializing_if = "Option::is_none")]
            d: Option<SecretBase64UrlBytes>,
            #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
            key_use: Option<&'a KeyUsage>,
            #[serde(skip_serializing_if = "Option::is_none")]
            key_ops: Option<&'a HashSet<KeyOperation>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            alg: Option<&'a KeyAlgorithm>,
            #[serde(skip_serializing_if = "Option::is_none")]
            kid: Option<&'a str>,
        }

        let mut repr = Repr {
            kty: "",
            k: None,
            crv: None,
            x: None,
            d: None,
            key_use: self.key_use.as_ref(),
            key_ops: self.key_operations.as_ref(),
            alg: self.algorithm.as_ref(),
            kid: self.key_id.as_deref(),
        };

        match &self.key_type {
            JsonWebKeyType::Symmetric(seq) => {
                repr.kty = "oct";
                repr.k = Some(Base64UrlBytes(seq.as_bytes().to_vec()));
            }
            JsonWebKeyType::Okp(key) => {
                repr.kty = "OKP";
                repr.crv = Some("X25519");
                repr.x = Some(Base64UrlBytes(key.public_bytes().to_vec()));
                repr.d = key
                    .secret()
                    .map(|s| SecretBase64UrlBytes::from(Vec::from(s.to_bytes())));
            }
        }

        repr.serialize(serializer)
    }
}
