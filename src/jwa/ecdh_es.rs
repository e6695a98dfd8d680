use super::AesKw;

/// Elliptic Curve Diffie-Hellman Ephemeral Static key agreement as defined
/// in [section 4.6 of RFC 7518]
///
/// [section 4.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6>
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum EcDhES {
    /// The agreed key is used directly as the CEK (Direct Key Agreement)
    Direct,
    /// The agreed key wraps the CEK using AES Key Wrap (Key Agreement with
    /// Key Wrapping)
    AesKw(AesKw),
}

impl From<EcDhES> for super::KeyManagementAlgorithm {
    fn from(x: EcDhES) -> Self {
        Self::EcDhES(x)
    }
}
