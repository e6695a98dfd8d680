#![cfg(feature = "zip")]

// DEFLATE payload compression, which only exists behind the `zip` feature
// and only runs when the headers ask for it.

use jwe::{
    format::JweFormat,
    jwk::JsonWebKey,
    JsonWebEncryption, JweBuilder, JweDecrypter,
};
use serde_json::json;

mod common;
use common::header;

#[test]
fn compressed_round_trip() {
    let registry = common::registry()
        .restrict_to(&["dir"], &["A256GCM"], &["DEF"])
        .unwrap();
    let key = JsonWebKey::octet_sequence(&[0x51; 32]);

    let payload = b"repetitive repetitive repetitive repetitive repetitive payload".repeat(8);

    let jwe = JweBuilder::new(&registry)
        .payload(payload.clone())
        .protected_header(header(json!({"alg": "dir", "enc": "A256GCM", "zip": "DEF"})))
        .add_recipient(&key)
        .build()
        .unwrap();

    // The ciphertext covers the compressed payload, not the raw one.
    assert!(jwe.ciphertext().len() < payload.len());

    let parsed: JsonWebEncryption = jwe
        .serialize(JweFormat::Compact)
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(
        JweDecrypter::new(&registry).decrypt(&parsed, &key).unwrap(),
        payload
    );
}

#[test]
fn compression_outside_the_allowlist_is_rejected() {
    // `DEF` is implemented, but this registry does not allow it.
    let registry = common::registry()
        .restrict_to(&["dir"], &["A256GCM"], &[])
        .unwrap();
    let key = JsonWebKey::octet_sequence(&[0x52; 32]);

    let err = JweBuilder::new(&registry)
        .payload(*b"x")
        .protected_header(header(json!({"alg": "dir", "enc": "A256GCM", "zip": "DEF"})))
        .add_recipient(&key)
        .build()
        .unwrap_err();
    assert!(matches!(err, jwe::ConfigError::UnsupportedCompression(_)));
}
