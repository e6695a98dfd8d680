// Round trips across all three serializations, multi-recipient envelopes,
// tamper detection, allowlisting and key-usage enforcement.

use std::str::FromStr;

use jwe::{
    format::{JweFormat, SerializeError},
    jwa::{AesKw, KeyAlgorithm, KeyManagementAlgorithm},
    jwk::{JsonWebKey, KeyOperation, KeyUsage, OkpKey},
    Base64UrlString, ConfigError, DecryptError, JsonWebEncryption, JweBuilder, JweDecrypter,
};
use serde_json::json;

mod common;
use common::{header, registry};

/// Re-encodes one segment of a compact JWE with a flipped bit.
fn tamper_segment(compact: &str, index: usize) -> String {
    let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
    let mut bytes = Base64UrlString::from_str(&parts[index]).unwrap().decode();
    *bytes.last_mut().expect("segment must not be empty") ^= 1;
    parts[index] = Base64UrlString::encode(&bytes).into_inner();
    parts.join(".")
}

#[test]
fn dir_round_trip_and_wrong_key_is_opaque() {
    let registry = registry().restrict_to(&["dir"], &["A128GCM"], &[]).unwrap();
    let key = JsonWebKey::octet_sequence(&[0x2a; 16]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"secret message")
        .protected_header(header(json!({"alg": "dir", "enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap();

    let compact = jwe.serialize(JweFormat::Compact).unwrap();
    let parsed: JsonWebEncryption = compact.parse().unwrap();

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(decrypter.decrypt(&parsed, &key).unwrap(), b"secret message");

    // Any other 16 byte key must fail with the generic outcome, not an
    // error naming the mismatch.
    let stranger = JsonWebKey::octet_sequence(&[0x2b; 16]);
    assert!(matches!(
        decrypter.decrypt(&parsed, &stranger),
        Err(DecryptError::Failed(_))
    ));
}

#[test]
fn aes_kw_round_trips_through_every_serialization() {
    let registry = registry();
    let key = JsonWebKey::octet_sequence(&[7u8; 32]);
    let payload = b"fly, you fools".to_vec();

    let build = || {
        JweBuilder::new(&registry)
            .payload(payload.clone())
            .protected_header(header(json!({"alg": "A256KW", "enc": "A256GCM"})))
            .add_recipient(&key)
            .build()
            .unwrap()
    };

    let decrypter = JweDecrypter::new(&registry);
    for format in [
        JweFormat::Compact,
        JweFormat::JsonFlattened,
        JweFormat::JsonGeneral,
    ] {
        let serialized = build().serialize(format).unwrap();
        let parsed: JsonWebEncryption = serialized.parse().unwrap();
        assert_eq!(decrypter.decrypt(&parsed, &key).unwrap(), payload);
    }
}

#[test]
fn gcm_key_wrap_emits_per_recipient_parameters() {
    let registry = registry();
    let key = JsonWebKey::octet_sequence(&[1u8; 16]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"wrapped with gcm")
        .protected_header(header(json!({"alg": "A128GCMKW", "enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap();

    // The wrapping algorithm appends its parameters to the recipient's
    // unprotected header, never to the shared protected one.
    let recipient = &jwe.recipients()[0];
    assert!(recipient.header().get("iv").is_some());
    assert!(recipient.header().get("tag").is_some());
    assert!(jwe.protected_header().get("iv").is_none());

    let serialized = jwe.serialize(JweFormat::JsonFlattened).unwrap();
    let parsed: JsonWebEncryption = serialized.parse().unwrap();
    assert_eq!(
        JweDecrypter::new(&registry).decrypt(&parsed, &key).unwrap(),
        b"wrapped with gcm"
    );
}

#[test]
fn ecdh_es_direct_agreement_round_trips() {
    let registry = registry();
    let recipient_key = JsonWebKey::new(OkpKey::generate());

    let jwe = JweBuilder::new(&registry)
        .payload(*b"agreed upon")
        .protected_header(header(json!({"alg": "ECDH-ES", "enc": "A256GCM"})))
        .add_recipient(&recipient_key)
        .build()
        .unwrap();

    // Direct agreement leaves the encrypted key empty and records the
    // ephemeral public key with the recipient.
    assert!(jwe.recipients()[0].encrypted_key().is_empty());
    assert!(jwe.recipients()[0].header().get("epk").is_some());

    let serialized = jwe.serialize(JweFormat::JsonFlattened).unwrap();
    let parsed: JsonWebEncryption = serialized.parse().unwrap();

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(
        decrypter.decrypt(&parsed, &recipient_key).unwrap(),
        b"agreed upon"
    );

    let stranger = JsonWebKey::new(OkpKey::generate());
    assert!(matches!(
        decrypter.decrypt(&parsed, &stranger),
        Err(DecryptError::Failed(_))
    ));
}

#[test]
fn multi_recipient_with_distinct_algorithms() {
    let registry = registry();

    let kw_key = JsonWebKey::octet_sequence(&[3u8; 32]).with_key_id("kw");
    let ecdh_key = JsonWebKey::new(OkpKey::generate()).with_key_id("ecdh");
    let gcmkw_key = JsonWebKey::octet_sequence(&[5u8; 16]).with_key_id("gcmkw");

    let jwe = JweBuilder::new(&registry)
        .payload(*b"one ciphertext for everyone")
        .protected_header(header(json!({"enc": "A128GCM"})))
        .add_recipient_with_header(&kw_key, header(json!({"alg": "A256KW", "kid": "kw"})))
        .add_recipient_with_header(
            &ecdh_key,
            header(json!({"alg": "ECDH-ES+A128KW", "kid": "ecdh"})),
        )
        .add_recipient_with_header(
            &gcmkw_key,
            header(json!({"alg": "A128GCMKW", "kid": "gcmkw"})),
        )
        .build()
        .unwrap();

    let serialized = jwe.serialize(JweFormat::JsonGeneral).unwrap();
    let parsed: JsonWebEncryption = serialized.parse().unwrap();
    assert_eq!(parsed.recipients().len(), 3);

    let decrypter = JweDecrypter::new(&registry);
    for key in [&kw_key, &ecdh_key, &gcmkw_key] {
        assert_eq!(
            decrypter.decrypt(&parsed, key).unwrap(),
            b"one ciphertext for everyone"
        );
    }

    // A key belonging to nobody fails with the generic outcome.
    let stranger = JsonWebKey::octet_sequence(&[9u8; 32]);
    assert!(matches!(
        decrypter.decrypt(&parsed, &stranger),
        Err(DecryptError::Failed(_))
    ));
}

#[test]
fn every_tampered_segment_fails_identically() {
    let registry = registry();
    let key = JsonWebKey::octet_sequence(&[6u8; 16]);

    let compact = JweBuilder::new(&registry)
        .payload(*b"do not touch")
        .protected_header(header(
            json!({"alg": "A128KW", "enc": "A128GCM", "kid": "tamper-me"}),
        ))
        .add_recipient(&key)
        .build()
        .unwrap()
        .serialize(JweFormat::Compact)
        .unwrap();

    let decrypter = JweDecrypter::new(&registry);

    // Segments 1..=4: encrypted key, IV, ciphertext, tag.
    for segment in 1..=4 {
        let tampered = tamper_segment(&compact, segment);
        let parsed: JsonWebEncryption = tampered.parse().unwrap();
        assert!(
            matches!(
                decrypter.decrypt(&parsed, &key),
                Err(DecryptError::Failed(_))
            ),
            "bit flip in segment {segment} must fail opaquely"
        );
    }

    // Segment 0 is the protected header. Change a byte inside a string
    // value so the JSON still parses; the envelope must still fail because
    // the AAD no longer matches.
    let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
    let protected = String::from_utf8(
        Base64UrlString::from_str(&parts[0]).unwrap().decode(),
    )
    .unwrap();
    let protected = protected.replace("tamper-me", "tamper-ME");
    parts[0] = Base64UrlString::encode(protected.as_bytes()).into_inner();

    let parsed: JsonWebEncryption = parts.join(".").parse().unwrap();
    assert!(matches!(
        decrypter.decrypt(&parsed, &key),
        Err(DecryptError::Failed(_))
    ));
}

#[test]
fn external_aad_is_authenticated_and_blocks_compact() {
    let registry = registry();
    let key = JsonWebKey::octet_sequence(&[8u8; 32]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"enveloped")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .external_aad(*b"routing metadata")
        .add_recipient(&key)
        .build()
        .unwrap();

    assert!(matches!(
        jwe.serialize(JweFormat::Compact),
        Err(SerializeError::ExternalAad)
    ));

    let serialized = jwe.serialize(JweFormat::JsonGeneral).unwrap();
    let parsed: JsonWebEncryption = serialized.parse().unwrap();
    assert_eq!(
        parsed.additional_authenticated_data(),
        Some(b"routing metadata".as_slice())
    );

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(decrypter.decrypt(&parsed, &key).unwrap(), b"enveloped");

    // Swapping the external AAD invalidates the tag.
    let swapped = serialized.replace(
        &Base64UrlString::encode(b"routing metadata").into_inner(),
        &Base64UrlString::encode(b"routing metadatb").into_inner(),
    );
    let parsed: JsonWebEncryption = swapped.parse().unwrap();
    assert!(matches!(
        decrypter.decrypt(&parsed, &key),
        Err(DecryptError::Failed(_))
    ));
}

#[test]
fn compact_cannot_express_unprotected_state() {
    let registry = registry();
    let key_a = JsonWebKey::octet_sequence(&[1u8; 32]);
    let key_b = JsonWebKey::octet_sequence(&[2u8; 32]);

    let multi = JweBuilder::new(&registry)
        .payload(*b"two targets")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&key_a)
        .add_recipient(&key_b)
        .build()
        .unwrap();
    assert!(matches!(
        multi.serialize(JweFormat::Compact),
        Err(SerializeError::RequiresSingleRecipient(2))
    ));
    assert!(matches!(
        multi.serialize(JweFormat::JsonFlattened),
        Err(SerializeError::RequiresSingleRecipient(2))
    ));

    let unprotected = JweBuilder::new(&registry)
        .payload(*b"shared state")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .unprotected_header(header(json!({"kid": "visible"})))
        .add_recipient(&key_a)
        .build()
        .unwrap();
    assert!(matches!(
        unprotected.serialize(JweFormat::Compact),
        Err(SerializeError::UnprotectedHeaders)
    ));
    // The JSON forms carry it fine.
    let parsed: JsonWebEncryption = unprotected
        .serialize(JweFormat::JsonFlattened)
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(parsed.shared_unprotected_header().key_id(), Some("visible"));
    assert_eq!(
        JweDecrypter::new(&registry).decrypt(&parsed, &key_a).unwrap(),
        b"shared state"
    );
}

#[test]
fn algorithms_outside_the_allowlist_are_rejected() {
    let full = registry();
    let restricted = full.restrict_to(&["dir"], &["A128GCM"], &[]).unwrap();
    let key = JsonWebKey::octet_sequence(&[4u8; 32]);

    // Implemented and registered in the full registry, but not allowlisted.
    let err = JweBuilder::new(&restricted)
        .payload(*b"nope")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnsupportedAlgorithm(name) if name == "A256KW"
    ));

    // Same on the decryption side: the envelope is fine, the local policy
    // is not, and the error says so precisely.
    let jwe = JweBuilder::new(&full)
        .payload(*b"built elsewhere")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap();
    let parsed: JsonWebEncryption = jwe
        .serialize(JweFormat::Compact)
        .unwrap()
        .parse()
        .unwrap();
    assert!(matches!(
        JweDecrypter::new(&restricted).decrypt(&parsed, &key),
        Err(DecryptError::Config(ConfigError::UnsupportedAlgorithm(_)))
    ));
}

#[test]
fn key_usage_violations_fail_before_cryptography() {
    let registry = registry();

    let signing_key =
        JsonWebKey::octet_sequence(&[1u8; 32]).with_key_use(KeyUsage::Signing);
    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&signing_key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::KeyUsageViolation(_)));

    let no_wrap_key = JsonWebKey::octet_sequence(&[1u8; 32])
        .with_key_operations([KeyOperation::Encrypt, KeyOperation::Decrypt]);
    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&no_wrap_key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::KeyUsageViolation(_)));

    let pinned_key = JsonWebKey::octet_sequence(&[1u8; 32]).with_algorithm(
        KeyAlgorithm::KeyManagement(KeyManagementAlgorithm::AesKw(AesKw::Aes128)),
    );
    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&pinned_key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::KeyUsageViolation(_)));
}

#[test]
fn direct_key_of_the_wrong_size_is_a_configuration_error() {
    let registry = registry();
    let short_key = JsonWebKey::octet_sequence(&[1u8; 16]);

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "dir", "enc": "A256GCM"})))
        .add_recipient(&short_key)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidKeyLength {
            expected: 32,
            found: 16
        }
    ));
}

#[test]
fn only_one_direct_recipient_is_allowed() {
    let registry = registry();
    let dir_key = JsonWebKey::octet_sequence(&[1u8; 16]);
    let agreement_key = JsonWebKey::new(OkpKey::generate());

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"enc": "A128GCM"})))
        .add_recipient_with_header(&dir_key, header(json!({"alg": "dir"})))
        .add_recipient_with_header(&agreement_key, header(json!({"alg": "ECDH-ES"})))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DirectModeConflict));
}

#[test]
fn one_direct_recipient_may_coexist_with_wrapping_recipients() {
    let registry = registry();
    let dir_key = JsonWebKey::octet_sequence(&[0x11; 16]);
    let kw_key = JsonWebKey::octet_sequence(&[0x22; 32]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"shared cek")
        .protected_header(header(json!({"enc": "A128GCM"})))
        .add_recipient_with_header(&dir_key, header(json!({"alg": "dir"})))
        .add_recipient_with_header(&kw_key, header(json!({"alg": "A256KW"})))
        .build()
        .unwrap();

    let parsed: JsonWebEncryption = jwe
        .serialize(JweFormat::JsonGeneral)
        .unwrap()
        .parse()
        .unwrap();

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(decrypter.decrypt(&parsed, &dir_key).unwrap(), b"shared cek");
    assert_eq!(decrypter.decrypt(&parsed, &kw_key).unwrap(), b"shared cek");
}

#[test]
fn malformed_builder_state_fails_fast() {
    let registry = registry();
    let key = JsonWebKey::octet_sequence(&[1u8; 16]);

    let err = JweBuilder::new(&registry)
        .protected_header(header(json!({"alg": "dir", "enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingPayload));

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "dir", "enc": "A128GCM"})))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::NoRecipients));

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "dir"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingHeader("enc")));

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"enc": "A128GCM"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingHeader("alg")));

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "dir", "enc": "A128GCM", "zip": "GZIP"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedCompression(_)));
}

#[test]
fn recipients_must_agree_on_the_content_encryption() {
    let registry = registry();
    let key_a = JsonWebKey::octet_sequence(&[1u8; 32]);
    let key_b = JsonWebKey::octet_sequence(&[2u8; 32]);

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .add_recipient_with_header(&key_a, header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient_with_header(&key_b, header(json!({"alg": "A256KW", "enc": "A256GCM"})))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::ContentEncryptionMismatch));
}

#[test]
fn selecting_a_recipient_by_index() {
    let registry = registry();
    let key_a = JsonWebKey::octet_sequence(&[1u8; 32]);
    let key_b = JsonWebKey::octet_sequence(&[2u8; 32]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"pick me")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&key_a)
        .add_recipient(&key_b)
        .build()
        .unwrap();

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(
        decrypter.decrypt_recipient(&jwe, &key_b, 1).unwrap(),
        b"pick me"
    );
    assert!(matches!(
        decrypter.decrypt_recipient(&jwe, &key_b, 0),
        Err(DecryptError::Failed(_))
    ));
    assert!(matches!(
        decrypter.decrypt_recipient(&jwe, &key_b, 2),
        Err(DecryptError::Config(ConfigError::RecipientIndex(2)))
    ));
}

#[test]
fn trying_several_candidate_keys() {
    let registry = registry();
    let right = JsonWebKey::octet_sequence(&[1u8; 32]);
    let wrong = JsonWebKey::octet_sequence(&[2u8; 32]);

    let jwe = JweBuilder::new(&registry)
        .payload(*b"needle")
        .protected_header(header(json!({"alg": "A256KW", "enc": "A128GCM"})))
        .add_recipient(&right)
        .build()
        .unwrap();

    let decrypter = JweDecrypter::new(&registry);
    assert_eq!(
        decrypter
            .decrypt_with_keys(&jwe, &[wrong.clone(), right])
            .unwrap(),
        b"needle"
    );
    assert!(matches!(
        decrypter.decrypt_with_keys(&jwe, &[wrong]),
        Err(DecryptError::Failed(_))
    ));
}
