/// Different variants of AES GCM, used both for content encryption
/// ([section 5.3 of RFC 7518]) and for key wrapping ([section 4.7]).
///
/// The variants differ only in the size of the AES key.
///
/// [section 5.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.3>
/// [section 4.7]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7>
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum AesGcm {
    /// AES GCM using a 128-bit key
    Aes128,
    /// AES GCM using a 192-bit key
    Aes192,
    /// AES GCM using a 256-bit key
    Aes256,
}

impl AesGcm {
    /// The size of the AES key in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

impl From<AesGcm> for super::ContentEncryptionAlgorithm {
    fn from(x: AesGcm) -> Self {
        Self::AesGcm(x)
    }
}
