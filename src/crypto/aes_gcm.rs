//! Content encryption with AES GCM (`A128GCM`, `A192GCM`, `A256GCM`)

use alloc::vec::Vec;

use aes_gcm::{
    aead::{consts::U12, generic_array::typenum::Unsigned, AeadCore, AeadInPlace, Nonce, Tag},
    Aes128Gcm, Aes256Gcm, AesGcm as AesGcmCipher, KeyInit,
};

use super::{EncryptedContent, Error, Result};
use crate::jwa::{AesGcm, ContentEncryptionAlgorithm};

// `aes-gcm` only aliases the 128 and 256 bit variants.
type Aes192Gcm = AesGcmCipher<aes::Aes192, U12>;

/// The AES GCM content encryption family, parameterized by key size.
#[derive(Debug, Clone, Copy)]
pub struct AesGcmEncryption {
    variant: AesGcm,
}

impl AesGcmEncryption {
    /// Creates the content encryption algorithm for the given variant.
    pub const fn new(variant: AesGcm) -> Self {
        Self { variant }
    }
}

impl super::ContentEncryption for AesGcmEncryption {
    fn name(&self) -> ContentEncryptionAlgorithm {
        ContentEncryptionAlgorithm::AesGcm(self.variant)
    }

    fn key_size(&self) -> usize {
        self.variant.key_size()
    }

    fn iv_size(&self) -> usize {
        12
    }

    fn encrypt(
        &self,
        cek: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<EncryptedContent> {
        if cek.len() != self.key_size() {
            return Err(Error::new());
        }

        match self.variant {
            AesGcm::Aes128 => seal::<Aes128Gcm>(cek, iv, plaintext, aad),
            AesGcm::Aes192 => seal::<Aes192Gcm>(cek, iv, plaintext, aad),
            AesGcm::Aes256 => seal::<Aes256Gcm>(cek, iv, plaintext, aad),
        }
    }

    fn decrypt(
        &self,
        cek: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        if cek.len() != self.key_size() {
            return Err(Error::new());
        }

        match self.variant {
            AesGcm::Aes128 => open::<Aes128Gcm>(cek, iv, ciphertext, tag, aad),
            AesGcm::Aes192 => open::<Aes192Gcm>(cek, iv, ciphertext, tag, aad),
            AesGcm::Aes256 => open::<Aes256Gcm>(cek, iv, ciphertext, tag, aad),
        }
    }
}

pub(crate) fn seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<EncryptedContent>
where
    C: AeadInPlace + KeyInit,
{
    if iv.len() != <C as AeadCore>::NonceSize::USIZE {
        return Err(Error::new());
    }

    let cipher = C::new_from_slice(key).map_err(|_| Error::new())?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<C>::from_slice(iv), aad, &mut buffer)
        .map_err(|_| Error::new())?;

    Ok(EncryptedContent {
        ciphertext: buffer,
        tag: tag.to_vec(),
    })
}

pub(crate) fn open<C>(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>>
where
    C: AeadInPlace + KeyInit,
{
    if iv.len() != <C as AeadCore>::NonceSize::USIZE
        || tag.len() != <C as AeadCore>::TagSize::USIZE
    {
        return Err(Error::new());
    }

    let cipher = C::new_from_slice(key).map_err(|_| Error::new())?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(iv),
            aad,
            &mut buffer,
            Tag::<C>::from_slice(tag),
        )
        .map_err(|_| Error::new())?;

    Ok(buffer)
}

/// Dispatches [`seal`] over the variant table.
pub(crate) fn seal_variant(
    variant: AesGcm,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<EncryptedContent> {
    match variant {
        AesGcm::Aes128 => seal::<Aes128Gcm>(key, iv, plaintext, aad),
        AesGcm::Aes192 => seal::<Aes192Gcm>(key, iv, plaintext, aad),
        AesGcm::Aes256 => seal::<Aes256Gcm>(key, iv, plaintext, aad),
    }
}

/// Dispatches [`open`] over the variant table.
pub(crate) fn open_variant(
    variant: AesGcm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    match variant {
        AesGcm::Aes128 => open::<Aes128Gcm>(key, iv, ciphertext, tag, aad),
        AesGcm::Aes192 => open::<Aes192Gcm>(key, iv, ciphertext, tag, aad),
        AesGcm::Aes256 => open::<Aes256Gcm>(key, iv, ciphertext, tag, aad),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ContentEncryption as _;

    #[test]
    fn round_trip_all_variants() {
        for variant in [AesGcm::Aes128, AesGcm::Aes192, AesGcm::Aes256] {
            let enc = AesGcmEncryption::new(variant);
            let cek: Vec<u8> = (0..variant.key_size() as u8).collect();
            let iv = [7u8; 12];

            let sealed = enc
                .encrypt(&cek, &iv, b"attack at dawn", b"header")
                .unwrap();
            assert_eq!(sealed.tag.len(), 16);

            let opened = enc
                .decrypt(&cek, &iv, &sealed.ciphertext, &sealed.tag, b"header")
                .unwrap();
            assert_eq!(opened, b"attack at dawn");
        }
    }

    #[test]
    fn forged_tag_and_wrong_aad_fail() {
        let enc = AesGcmEncryption::new(AesGcm::Aes128);
        let cek = [1u8; 16];
        let iv = [2u8; 12];

        let sealed = enc.encrypt(&cek, &iv, b"payload", b"aad").unwrap();

        let mut tag = sealed.tag.clone();
        tag[0] ^= 1;
        assert!(enc
            .decrypt(&cek, &iv, &sealed.ciphertext, &tag, b"aad")
            .is_err());

        assert!(enc
            .decrypt(&cek, &iv, &sealed.ciphertext, &sealed.tag, b"other aad")
            .is_err());
    }

    #[test]
    fn wrong_key_size_is_rejected_before_any_aead_call() {
        let enc = AesGcmEncryption::new(AesGcm::Aes256);
        assert!(enc.encrypt(&[0u8; 16], &[0u8; 12], b"x", b"").is_err());
        assert!(enc
            .decrypt(&[0u8; 16], &[0u8; 12], b"x", &[0u8; 16], b"")
            .is_err());
    }
}
