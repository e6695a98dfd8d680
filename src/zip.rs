//! Payload compression (the `zip` header parameter)
//!
//! Compression happens before encryption and is reversed after decryption,
//! exactly as [RFC 7516] inherits it. Be aware that compressing plaintext
//! an attacker can partially influence leaks information about the
//! plaintext through the ciphertext length (compression oracles). For that
//! reason no compression method is built in unless the off-by-default
//! `zip` cargo feature is enabled, and nothing ever turns compression on
//! silently: it only runs when the caller put a `zip` parameter into the
//! headers.
//!
//! [RFC 7516]: <https://www.rfc-editor.org/rfc/rfc7516.html>

use alloc::vec::Vec;
use core::fmt;

use crate::jwa::CompressionAlgorithm;

/// The error type for failed compression operations.
///
/// Carries no detail; during decryption a decompression failure must be
/// indistinguishable from any other failure.
pub struct Error(());

impl Error {
    #[cfg_attr(not(feature = "zip"), allow(dead_code))]
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("compression operation failed")
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("zip::Error")
    }
}

impl core::error::Error for Error {}

/// A compression method usable for the `zip` header parameter.
pub trait Compression: Send + Sync {
    /// The identifier this method registers under.
    fn name(&self) -> CompressionAlgorithm;

    /// Compresses the payload before encryption.
    ///
    /// # Errors
    ///
    /// Fails if the underlying encoder reports an error.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// Reverses [`compress`](Self::compress) after decryption.
    ///
    /// # Errors
    ///
    /// Fails opaquely on malformed input.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, Error>;
}

/// DEFLATE ([RFC 1951]), the `DEF` compression method.
///
/// [RFC 1951]: <https://datatracker.ietf.org/doc/html/rfc1951>
#[cfg(feature = "zip")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflate;

#[cfg(feature = "zip")]
impl Compression for Deflate {
    fn name(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Deflate
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        use std::io::Write as _;

        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).map_err(|_| Error::new())?;
        encoder.finish().map_err(|_| Error::new())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        use std::io::Read as _;

        let mut decoded = Vec::new();
        flate2::read::DeflateDecoder::new(data)
            .read_to_end(&mut decoded)
            .map_err(|_| Error::new())?;
        Ok(decoded)
    }
}
