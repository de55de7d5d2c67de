//! Signature verification scenarios with fixed RSA key material.
//!
//! Covers the sign/verify round-trip, tamper and wrong-message rejection,
//! base64 signature transport, key fingerprint canonicalization across PEM
//! encodings, and the error/verdict split for malformed keys and
//! cross-algorithm signatures.

use updraft_crypto::{
    rsa_pss_sign, verify_signature, CryptoError, KeyType, PublicKey, Signature, SignatureMethod,
};

const DEVICE_KEY_PKCS8: &str = include_str!("data/device_key_pkcs8.pem");
const DEVICE_KEY_PKCS1: &str = include_str!("data/device_key_pkcs1.pem");
const DEVICE_PUB_SPKI: &str = include_str!("data/device_pub_spki.pem");
const DEVICE_PUB_PKCS1: &str = include_str!("data/device_pub_pkcs1.pem");

const MANIFEST: &[u8] = b"{\"ecu_serial\":\"demo-1\",\"installed\":\"image-7\"}";

fn device_key() -> PublicKey {
    PublicKey::new(KeyType::Rsa, DEVICE_PUB_SPKI).expect("device public key")
}

#[test]
fn test_rsa_pss_roundtrip() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    assert!(verify_signature(&device_key(), &sig, MANIFEST).expect("verify"));
}

#[test]
fn test_rsa_pss_base64_transport() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    let text = Signature::from_raw(SignatureMethod::RsaPss, raw).to_base64();

    let decoded = Signature::from_encoded(SignatureMethod::RsaPss, &text).expect("decode");
    assert!(verify_signature(&device_key(), &decoded, MANIFEST).expect("verify"));
}

#[test]
fn test_rsa_pss_rejects_flipped_bit() {
    let mut raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    raw[0] ^= 0x01;
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    assert!(!verify_signature(&device_key(), &sig, MANIFEST).expect("verify"));
}

#[test]
fn test_rsa_pss_rejects_different_message() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    assert!(!verify_signature(&device_key(), &sig, b"another manifest").expect("verify"));
}

#[test]
fn test_rsa_pss_rejects_truncated_signature() {
    let mut raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    raw.truncate(raw.len() - 1);
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    assert!(!verify_signature(&device_key(), &sig, MANIFEST).expect("verify"));
}

#[test]
fn test_rsa_pss_sign_accepts_traditional_pem() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS1, MANIFEST).expect("sign");
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    assert!(verify_signature(&device_key(), &sig, MANIFEST).expect("verify"));
}

#[test]
fn test_rsa_key_id_same_across_pem_encodings() {
    let spki = PublicKey::new(KeyType::Rsa, DEVICE_PUB_SPKI).expect("spki form");
    let pkcs1 = PublicKey::new(KeyType::Rsa, DEVICE_PUB_PKCS1).expect("pkcs1 form");
    assert_eq!(spki.key_id(), pkcs1.key_id());
    assert_eq!(spki.spki_der(), pkcs1.spki_der());
}

#[test]
fn test_rsa_key_rejects_ed25519_method_signature() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    let mislabeled = Signature::from_raw(SignatureMethod::Ed25519, raw);
    assert!(!verify_signature(&device_key(), &mislabeled, MANIFEST).expect("verify"));
}

#[test]
fn test_truncated_key_is_malformed_not_false() {
    let truncated = &DEVICE_PUB_SPKI[..DEVICE_PUB_SPKI.len() / 2];
    let err = PublicKey::new(KeyType::Rsa, truncated).unwrap_err();
    assert!(matches!(err, CryptoError::MalformedKey { .. }));
}

#[test]
fn test_rsa_private_key_rejected_as_public_material() {
    let err = PublicKey::new(KeyType::Rsa, DEVICE_KEY_PKCS8).unwrap_err();
    assert!(matches!(err, CryptoError::MalformedKey { .. }));
}

#[test]
fn test_verdict_is_repeatable() {
    let raw = rsa_pss_sign(DEVICE_KEY_PKCS8, MANIFEST).expect("sign");
    let sig = Signature::from_raw(SignatureMethod::RsaPss, raw);
    let key = device_key();
    for _ in 0..3 {
        assert!(verify_signature(&key, &sig, MANIFEST).expect("verify"));
    }
}
