//! Key agreement with ECDH-ES on X25519 (`ECDH-ES`, `ECDH-ES+A*KW`)
//!
//! The agreed secret runs through the Concat KDF ([section 4.6 of RFC
//! 7518], SHA-256) and either becomes the CEK directly or wraps a random
//! CEK with AES Key Wrap. The producing side generates a fresh ephemeral
//! key per recipient and emits it as the `epk` header parameter; the
//! consuming side recognises itself by the presence of `epk` in the merged
//! header view.
//!
//! [section 4.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6>

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use rand_core::OsRng;
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::Zeroizing;

use super::{
    aes_kw::{unwrap_with, wrap_with},
    AgreedCek, Cek, Error, ExtraHeaders, KeyManagementMode, Result, WrappedCek,
};
use crate::{
    base64_url::Base64UrlString,
    header::JweHeader,
    jwa::{EcDhES, KeyManagementAlgorithm},
    jwk::JsonWebKey,
};

/// The ECDH-ES key agreement family on X25519.
#[derive(Debug, Clone, Copy)]
pub struct EcdhEs {
    variant: EcDhES,
}

impl EcdhEs {
    /// Creates the key agreement algorithm for the given variant.
    pub const fn new(variant: EcDhES) -> Self {
        Self { variant }
    }

    /// Runs the agreement and the Concat KDF, producing `key_len` bytes.
    ///
    /// Without an `epk` in the merged headers this is the producing side:
    /// an ephemeral key is generated and returned as an extra header. With
    /// an `epk` this is the consuming side and the recipient's secret
    /// scalar is required.
    fn agree(
        &self,
        key: &JsonWebKey,
        merged: &JweHeader,
        key_len: usize,
        alg_id: &str,
    ) -> Result<(Cek, ExtraHeaders)> {
        let okp = key.okp().ok_or(Error::new())?;

        let apu = merged.bytes_param("apu").unwrap_or_default();
        let apv = merged.bytes_param("apv").unwrap_or_default();

        let (shared, extra_headers) = match merged.object_param("epk") {
            Some(epk) => {
                let secret = okp.secret().ok_or(Error::new())?;
                let ephemeral = ephemeral_public_key(epk)?;
                (secret.diffie_hellman(&ephemeral), ExtraHeaders::new())
            }
            None => {
                let ephemeral = EphemeralSecret::random_from_rng(OsRng);
                let ephemeral_public = PublicKey::from(&ephemeral);

                let mut epk = Map::new();
                epk.insert("kty".into(), Value::String("OKP".into()));
                epk.insert("crv".into(), Value::String("X25519".into()));
                epk.insert(
                    "x".into(),
                    Value::String(
                        Base64UrlString::encode(ephemeral_public.as_bytes()).into_inner(),
                    ),
                );

                let mut extra_headers = ExtraHeaders::new();
                extra_headers.insert("epk".into(), Value::Object(epk));

                (ephemeral.diffie_hellman(okp.public()), extra_headers)
            }
        };

        let derived = concat_kdf(shared.as_bytes(), alg_id, &apu, &apv, key_len);
        Ok((derived, extra_headers))
    }
}

impl super::KeyManagement for EcdhEs {
    fn name(&self) -> KeyManagementAlgorithm {
        KeyManagementAlgorithm::EcDhES(self.variant)
    }

    fn mode(&self) -> KeyManagementMode {
        match self.variant {
            EcDhES::Direct => KeyManagementMode::DirectKeyAgreement,
            EcDhES::AesKw(_) => KeyManagementMode::KeyAgreementWithKeyWrapping,
        }
    }

    fn derive_cek(
        &self,
        key: &JsonWebKey,
        cek_len: usize,
        merged: &JweHeader,
    ) -> Result<AgreedCek> {
        if self.variant != EcDhES::Direct {
            return Err(Error::new());
        }

        // In Direct Key Agreement the AlgorithmID of the KDF is the `enc`
        // identifier the agreed key will be used with.
        let enc = merged.content_encryption().ok_or(Error::new())?;
        let (cek, extra_headers) = self.agree(key, merged, cek_len, &enc.to_string())?;

        Ok(AgreedCek { cek, extra_headers })
    }

    fn wrap_cek(&self, key: &JsonWebKey, cek: &Cek, merged: &JweHeader) -> Result<WrappedCek> {
        let EcDhES::AesKw(kw) = self.variant else {
            return Err(Error::new());
        };

        let alg_id = self.name().to_string();
        let (kek, extra_headers) = self.agree(key, merged, kw.key_size(), &alg_id)?;

        Ok(WrappedCek {
            encrypted_key: wrap_with(kw, kek.bytes(), cek.bytes())?,
            extra_headers,
        })
    }

    fn unwrap_cek(
        &self,
        key: &JsonWebKey,
        encrypted_key: &[u8],
        merged: &JweHeader,
    ) -> Result<Cek> {
        let EcDhES::AesKw(kw) = self.variant else {
            return Err(Error::new());
        };

        let alg_id = self.name().to_string();
        let (kek, _) = self.agree(key, merged, kw.key_size(), &alg_id)?;

        unwrap_with(kw, kek.bytes(), encrypted_key).map(Cek::new)
    }
}

/// Parses the `epk` header parameter into an X25519 public key.
fn ephemeral_public_key(epk: &Map<String, Value>) -> Result<PublicKey> {
    if epk.get("kty").and_then(Value::as_str) != Some("OKP")
        || epk.get("crv").and_then(Value::as_str) != Some("X25519")
    {
        return Err(Error::new());
    }

    let x = epk.get("x").and_then(Value::as_str).ok_or(Error::new())?;
    let x: Base64UrlString = x.parse().map_err(|_| Error::new())?;
    let x: [u8; 32] = x.decode().as_slice().try_into().map_err(|_| Error::new())?;

    Ok(PublicKey::from(x))
}

/// The Concat KDF of [NIST SP 800-56A] with SHA-256, as profiled by
/// [section 4.6.2 of RFC 7518].
///
/// [NIST SP 800-56A]: <https://csrc.nist.gov/pubs/sp/800/56/a/r3/final>
/// [section 4.6.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6.2>
fn concat_kdf(z: &[u8], alg: &str, apu: &[u8], apv: &[u8], key_len: usize) -> Cek {
    let mut derived = Zeroizing::new(Vec::with_capacity(key_len.next_multiple_of(32)));

    let reps = key_len.div_ceil(32) as u32;
    for counter in 1..=reps {
        let mut digest = Sha256::new();
        digest.update(counter.to_be_bytes());
        digest.update(z);

        for datum in [alg.as_bytes(), apu, apv] {
            digest.update((datum.len() as u32).to_be_bytes());
            digest.update(datum);
        }

        // SuppPubInfo is the requested key size in bits.
        digest.update(((key_len * 8) as u32).to_be_bytes());

        derived.extend_from_slice(&digest.finalize());
    }

    derived.truncate(key_len);
    Cek::new(core::mem::take(&mut *derived))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::KeyManagement as _,
        jwa::{AesKw, ContentEncryptionAlgorithm},
        jwk::OkpKey,
    };

    // RFC 7518 appendix C.
    #[test]
    fn concat_kdf_vector() {
        let z = [
            158, 86, 217, 29, 129, 113, 53, 211, 114, 131, 66, 131, 191, 132, 38, 156, 251, 49,
            110, 163, 129, 113, 8, 28, 62, 248, 200, 166, 212, 139, 241, 219,
        ];

        let derived = concat_kdf(&z, "A128GCM", b"Alice", b"Bob", 16);

        let expected: Base64UrlString = "VqqN6vgjbSBcIijNcacQGg".parse().unwrap();
        assert_eq!(derived.bytes(), expected.decode());
    }

    #[test]
    fn both_sides_agree_on_the_cek() {
        let recipient = JsonWebKey::new(OkpKey::generate());
        let alg = EcdhEs::new(EcDhES::Direct);

        let mut merged = JweHeader::new();
        merged.set_content_encryption(ContentEncryptionAlgorithm::AesGcm(
            crate::jwa::AesGcm::Aes256,
        ));

        // Producing side: no epk yet.
        let produced = alg.derive_cek(&recipient, 32, &merged).unwrap();
        assert!(produced.extra_headers.contains_key("epk"));

        // Consuming side: epk arrives via the merged headers.
        merged.extend(produced.extra_headers);
        let consumed = alg.derive_cek(&recipient, 32, &merged).unwrap();

        assert_eq!(produced.cek.bytes(), consumed.cek.bytes());
    }

    #[test]
    fn agreement_with_key_wrapping_round_trips() {
        let recipient = JsonWebKey::new(OkpKey::generate());
        let alg = EcdhEs::new(EcDhES::AesKw(AesKw::Aes128));
        let cek = Cek::new([0xab; 32].to_vec());

        let wrapped = alg.wrap_cek(&recipient, &cek, &JweHeader::new()).unwrap();
        assert!(wrapped.extra_headers.contains_key("epk"));

        let merged = JweHeader::from_map(wrapped.extra_headers);
        let unwrapped = alg
            .unwrap_cek(&recipient, &wrapped.encrypted_key, &merged)
            .unwrap();

        assert_eq!(unwrapped.bytes(), cek.bytes());
    }

    #[test]
    fn a_public_only_key_cannot_take_the_recipient_role() {
        let pair = OkpKey::generate();
        let public_only = JsonWebKey::new(pair.to_public());
        let alg = EcdhEs::new(EcDhES::AesKw(AesKw::Aes256));
        let cek = Cek::new([1; 16].to_vec());

        let wrapped = alg.wrap_cek(&public_only, &cek, &JweHeader::new()).unwrap();
        let merged = JweHeader::from_map(wrapped.extra_headers);

        assert!(alg
            .unwrap_cek(&public_only, &wrapped.encrypted_key, &merged)
            .is_err());
    }
}
