// The direct-encryption example of RFC 7520 section 5.6: the published
// envelopes must decrypt under the published key, and a fresh encryption
// with the same inputs must round trip through both serializations.

use std::str::FromStr;

use jwe::{
    format::JweFormat,
    header::JweHeader,
    jwk::JsonWebKey,
    Base64UrlString, DecryptError, JsonWebEncryption, JweBuilder, JweDecrypter,
};
use serde_json::json;

mod common;
use common::header;

const KEY: &str = r#"{
    "kty": "oct",
    "kid": "77c7e2b8-6e13-45cf-8672-617b5b45243a",
    "use": "enc",
    "alg": "A128GCM",
    "k": "XctOhJAkA-pD9Lh7ZgW_2A"
}"#;

const COMPACT: &str = "eyJhbGciOiJkaXIiLCJraWQiOiI3N2M3ZTJiOC02ZTEzLTQ1Y2YtODY3Mi02MTdiNWI0NTI0M2EiLCJlbmMiOiJBMTI4R0NNIn0..refa467QzzKx6QAB.JW_i_f52hww_ELQPGaYyeAB6HYGcR559l9TYnSovc23XJoBcW29rHP8yZOZG7YhLpT1bjFuvZPjQS-m0IFtVcXkZXdH_lr_FrdYt9HRUYkshtrMmIUAyGmUnd9zMDB2n0cRDIHAzFVeJUDxkUwVAE7_YGRPdcqMyiBoCO-FBdE-Nceb4h3-FtBP-c_BIwCPTjb9o0SbdcdREEMJMyZBH8ySWMVi1gPD9yxi-aQpGbSv_F9N4IZAxscj5g-NJsUPbjk29-s7LJAGb15wEBtXphVCgyy53CoIKLHHeJHXex45Uz9aKZSRSInZI-wjsY0yu3cT4_aQ3i1o-tiE-F8Ios61EKgyIQ4CWao8PFMj8TTnp.vbb32Xvllea2OtmHAdccRQ";

const FLATTENED_JSON: &str = r#"{"protected":"eyJhbGciOiJkaXIiLCJraWQiOiI3N2M3ZTJiOC02ZTEzLTQ1Y2YtODY3Mi02MTdiNWI0NTI0M2EiLCJlbmMiOiJBMTI4R0NNIn0","iv":"refa467QzzKx6QAB","ciphertext":"JW_i_f52hww_ELQPGaYyeAB6HYGcR559l9TYnSovc23XJoBcW29rHP8yZOZG7YhLpT1bjFuvZPjQS-m0IFtVcXkZXdH_lr_FrdYt9HRUYkshtrMmIUAyGmUnd9zMDB2n0cRDIHAzFVeJUDxkUwVAE7_YGRPdcqMyiBoCO-FBdE-Nceb4h3-FtBP-c_BIwCPTjb9o0SbdcdREEMJMyZBH8ySWMVi1gPD9yxi-aQpGbSv_F9N4IZAxscj5g-NJsUPbjk29-s7LJAGb15wEBtXphVCgyy53CoIKLHHeJHXex45Uz9aKZSRSInZI-wjsY0yu3cT4_aQ3i1o-tiE-F8Ios61EKgyIQ4CWao8PFMj8TTnp","tag":"vbb32Xvllea2OtmHAdccRQ"}"#;

fn payload() -> Vec<u8> {
    "You can trust us to stick with you through thick and \
     thin\u{2013}to the bitter end. And you can trust us to keep any \
     secret of yours\u{2013}closer than you keep it yourself. But you \
     cannot trust us to let you face trouble alone, and go off without \
     a word. We are your friends, Frodo."
        .as_bytes()
        .to_vec()
}

fn fixture_key() -> JsonWebKey {
    serde_json::from_str(KEY).unwrap()
}

fn fixture_registry() -> jwe::registry::AlgorithmRegistry {
    common::registry()
        .restrict_to(&["dir"], &["A128GCM"], &[])
        .unwrap()
}

#[test]
fn decrypts_the_published_compact_envelope() {
    let registry = fixture_registry();
    let jwe: JsonWebEncryption = COMPACT.parse().unwrap();

    assert_eq!(
        jwe.protected_header().key_id(),
        Some("77c7e2b8-6e13-45cf-8672-617b5b45243a")
    );
    assert_eq!(
        Base64UrlString::encode(jwe.iv()).into_inner(),
        "refa467QzzKx6QAB"
    );
    assert_eq!(
        Base64UrlString::encode(jwe.tag()).into_inner(),
        "vbb32Xvllea2OtmHAdccRQ"
    );

    let plaintext = JweDecrypter::new(&registry)
        .decrypt(&jwe, &fixture_key())
        .unwrap();
    assert_eq!(plaintext, payload());
}

#[test]
fn decrypts_the_published_json_envelope() {
    let registry = fixture_registry();
    let jwe: JsonWebEncryption = FLATTENED_JSON.parse().unwrap();

    let plaintext = JweDecrypter::new(&registry)
        .decrypt(&jwe, &fixture_key())
        .unwrap();
    assert_eq!(plaintext, payload());
}

#[test]
fn reencrypting_with_the_same_inputs_round_trips() {
    let registry = fixture_registry();
    let key = fixture_key();

    let protected: JweHeader = header(json!({
        "alg": "dir",
        "kid": "77c7e2b8-6e13-45cf-8672-617b5b45243a",
        "enc": "A128GCM",
    }));

    let jwe = JweBuilder::new(&registry)
        .payload(payload())
        .protected_header(protected.clone())
        .add_recipient(&key)
        .build()
        .unwrap();

    let decrypter = JweDecrypter::new(&registry);
    for format in [JweFormat::Compact, JweFormat::JsonGeneral] {
        let serialized = jwe.serialize(format).unwrap();
        let parsed: JsonWebEncryption = serialized.parse().unwrap();
        assert_eq!(parsed.protected_header(), &protected);
        assert_eq!(decrypter.decrypt(&parsed, &key).unwrap(), payload());
    }
}

#[test]
fn a_flipped_tag_bit_in_the_published_envelope_fails_opaquely() {
    let registry = fixture_registry();

    let mut segments: Vec<String> = COMPACT.split('.').map(str::to_string).collect();
    let mut bytes = Base64UrlString::from_str(&segments[4]).unwrap().decode();
    bytes[0] ^= 0x80;
    segments[4] = Base64UrlString::encode(&bytes).into_inner();

    let jwe: JsonWebEncryption = segments.join(".").parse().unwrap();
    assert!(matches!(
        JweDecrypter::new(&registry).decrypt(&jwe, &fixture_key()),
        Err(DecryptError::Failed(_))
    ));
}
