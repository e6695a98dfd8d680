//! Cryptographic primitives behind the JWE engine.
//!
//! This module defines the capability traits the engine drives —
//! [`ContentEncryption`] for the AEAD family and [`KeyManagement`] for CEK
//! transport — together with the built-in implementations of both. Errors
//! out of this layer are deliberately reason-free: nothing that depends on
//! secret data may influence what a caller (or an attacker) can observe.

pub mod aes_gcm;
pub mod aes_gcm_kw;
pub mod aes_kw;
pub mod dir;
pub mod ecdh_es;

use alloc::{string::String, vec, vec::Vec};
use core::{error, fmt};

use rand_core::{OsRng, RngCore as _};
use secrecy::{ExposeSecret as _, SecretSlice};
use serde_json::{Map, Value};

use crate::{
    header::JweHeader,
    jwa::{ContentEncryptionAlgorithm, KeyManagementAlgorithm},
    jwk::JsonWebKey,
};

/// The result type used for cryptographic operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The erased error type for every cryptographic failure.
///
/// It intentionally carries no detail: whether a key failed to parse, a
/// wrapped CEK had bad padding or an authentication tag did not verify must
/// be indistinguishable at every layer above this one.
pub struct Error(());

impl Error {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cryptographic operation failed")
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("crypto::Error")
    }
}

impl error::Error for Error {}

/// Additional header parameters emitted by a [`KeyManagement`] algorithm
/// while wrapping or agreeing a CEK.
///
/// These are merged into the *recipient's* unprotected header by the
/// builder, never into the shared protected header, which has to stay
/// identical across recipients.
pub type ExtraHeaders = Map<String, Value>;

/// A Content Encryption Key.
///
/// Lives exactly as long as one encryption or decryption operation and is
/// wiped when dropped. A CEK is never reused across independent encryption
/// operations.
pub struct Cek(SecretSlice<u8>);

impl Cek {
    /// Generates a fresh random CEK of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system's random number generator
    /// fails.
    pub fn generate(len: usize) -> Result<Self> {
        let mut buf = vec![0u8; len];
        OsRng.try_fill_bytes(&mut buf).map_err(|_| Error::new())?;
        Ok(Self(SecretSlice::from(buf)))
    }

    /// Wraps existing key bytes, taking ownership of them.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(SecretSlice::from(bytes))
    }

    /// The raw key bytes.
    pub fn bytes(&self) -> &[u8] {
        self.0.expose_secret()
    }

    /// The size of this key in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether this key is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Cek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cek({} bytes)", self.len())
    }
}

/// Ciphertext and authentication tag produced by one AEAD invocation.
#[derive(Debug)]
pub struct EncryptedContent {
    /// The encrypted payload.
    pub ciphertext: Vec<u8>,
    /// The authentication tag over ciphertext and AAD.
    pub tag: Vec<u8>,
}

/// An authenticated encryption (AEAD) algorithm usable as the `enc` of a
/// JWE.
pub trait ContentEncryption: Send + Sync {
    /// The identifier this algorithm registers under.
    fn name(&self) -> ContentEncryptionAlgorithm;

    /// The required CEK size in bytes.
    fn key_size(&self) -> usize;

    /// The required initialization vector size in bytes.
    fn iv_size(&self) -> usize;

    /// Encrypts `plaintext`, authenticating `aad` alongside it.
    ///
    /// # Errors
    ///
    /// Fails if `cek` or `iv` have the wrong length, before any
    /// cryptographic computation runs.
    fn encrypt(&self, cek: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8])
        -> Result<EncryptedContent>;

    /// Decrypts `ciphertext` and verifies `tag` over it and `aad`.
    ///
    /// Malformed lengths are rejected before any cryptographic computation
    /// runs; the tag comparison itself is constant-time.
    ///
    /// # Errors
    ///
    /// Fails opaquely, whether the input was malformed or the tag did not
    /// verify.
    fn decrypt(
        &self,
        cek: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>>;
}

/// How a key management algorithm determines the CEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyManagementMode {
    /// The recipient's key *is* the CEK (`dir`).
    DirectEncryption,
    /// A key agreement produces the CEK (`ECDH-ES`).
    DirectKeyAgreement,
    /// A randomly generated CEK is encrypted under the recipient's key
    /// (`A*KW`, `A*GCMKW`).
    KeyEncryption,
    /// A key agreement produces a key encryption key which wraps a randomly
    /// generated CEK (`ECDH-ES+A*KW`).
    KeyAgreementWithKeyWrapping,
}

impl KeyManagementMode {
    /// Whether this mode determines the CEK itself instead of transporting
    /// a randomly generated one.
    ///
    /// At most one recipient of a JWE may use such a mode, because all
    /// recipients share a single CEK.
    pub const fn is_direct(self) -> bool {
        matches!(
            self,
            Self::DirectEncryption | Self::DirectKeyAgreement
        )
    }
}

/// The result of wrapping a CEK for one recipient.
#[derive(Debug)]
pub struct WrappedCek {
    /// The encrypted CEK to place into the recipient structure.
    pub encrypted_key: Vec<u8>,
    /// Parameters to merge into the recipient's unprotected header.
    pub extra_headers: ExtraHeaders,
}

/// The result of deriving a CEK via a direct mode.
#[derive(Debug)]
pub struct AgreedCek {
    /// The derived CEK.
    pub cek: Cek,
    /// Parameters to merge into the recipient's unprotected header.
    pub extra_headers: ExtraHeaders,
}

/// A key management (`alg`) algorithm.
///
/// The capability set is flat: which of the three operations an
/// implementation supports follows from its [`mode`](Self::mode). Direct
/// modes implement [`derive_cek`](Self::derive_cek), wrapping modes
/// implement [`wrap_cek`](Self::wrap_cek) and
/// [`unwrap_cek`](Self::unwrap_cek); the unused operations keep their
/// failing default bodies.
pub trait KeyManagement: Send + Sync + core::fmt::Debug {
    /// The identifier this algorithm registers under.
    fn name(&self) -> KeyManagementAlgorithm;

    /// How this algorithm determines the CEK.
    fn mode(&self) -> KeyManagementMode;

    /// Produces the CEK itself (direct modes only).
    ///
    /// During encryption the merged headers carry no agreement parameters
    /// yet and the implementation emits them; during decryption it consumes
    /// them (e.g. `epk`).
    ///
    /// # Errors
    ///
    /// Fails opaquely on any mismatch between the key and the requested
    /// operation.
    fn derive_cek(
        &self,
        key: &JsonWebKey,
        cek_len: usize,
        merged: &JweHeader,
    ) -> Result<AgreedCek> {
        let _ = (key, cek_len, merged);
        Err(Error::new())
    }

    /// Encrypts the CEK under the recipient's key (wrapping modes only).
    ///
    /// # Errors
    ///
    /// Fails opaquely on any mismatch between the key and the requested
    /// operation.
    fn wrap_cek(&self, key: &JsonWebKey, cek: &Cek, merged: &JweHeader) -> Result<WrappedCek> {
        let _ = (key, cek, merged);
        Err(Error::new())
    }

    /// Decrypts an encrypted CEK (wrapping modes only).
    ///
    /// # Errors
    ///
    /// Fails opaquely, whatever the underlying reason.
    fn unwrap_cek(
        &self,
        key: &JsonWebKey,
        encrypted_key: &[u8],
        merged: &JweHeader,
    ) -> Result<Cek> {
        let _ = (key, encrypted_key, merged);
        Err(Error::new())
    }
}

/// Fills the given buffer with random data.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|_| Error::new())
}

/// Generates a fresh initialization vector of the given size.
pub(crate) fn generate_iv(len: usize) -> Result<Vec<u8>> {
    let mut iv = vec![0u8; len];
    fill_random(&mut iv)?;
    Ok(iv)
}
