//! Octet Key Pairs (OKP) on the X25519 curve as defined in [RFC 8037]
//!
//! [RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037>

use core::fmt;

use rand_core::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

/// An X25519 key (`kty` of `OKP`, `crv` of `X25519`) used for the `ECDH-ES`
/// key agreement family.
///
/// A key holding only the public point can address a recipient during
/// encryption; the secret scalar is required to take the recipient role
/// during decryption. The secret scalar is wiped on drop.
#[derive(Clone)]
pub struct OkpKey {
    public: PublicKey,
    secret: Option<StaticSecret>,
}

impl OkpKey {
    /// Generates a fresh X25519 key pair using the operating system's secure
    /// random number generator.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self {
            public: PublicKey::from(&secret),
            secret: Some(secret),
        }
    }

    /// Creates a public-only key from the raw public point.
    pub fn from_public(public: [u8; 32]) -> Self {
        Self {
            public: PublicKey::from(public),
            secret: None,
        }
    }

    /// Creates a full key pair from the raw secret scalar, deriving the
    /// public point from it.
    pub fn from_secret(secret: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret);
        Self {
            public: PublicKey::from(&secret),
            secret: Some(secret),
        }
    }

    /// The raw public point of this key.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Returns a key holding only the public point of `self`.
    pub fn to_public(&self) -> Self {
        Self {
            public: self.public,
            secret: None,
        }
    }

    /// Whether this key can take the recipient role during decryption.
    pub const fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub(crate) const fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) const fn secret(&self) -> Option<&StaticSecret> {
        self.secret.as_ref()
    }
}

impl From<OkpKey> for super::JsonWebKeyType {
    fn from(x: OkpKey) -> Self {
        super::JsonWebKeyType::Okp(x)
    }
}

// The secret scalar must never end up in debug output.
impl fmt::Debug for OkpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OkpKey")
            .field("crv", &"X25519")
            .field("public", &self.public)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
