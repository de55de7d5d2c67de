//! Signature creation and verification for update metadata.
//!
//! Verification dispatches on the key's declared algorithm and never on the
//! shape of the signature bytes. `Ok(false)` means the signature did not
//! authenticate the message under that key; `Err` means the question was
//! ill-posed (unparseable key, undecodable signature text). Rejections this
//! module expects to see in normal operation are never logged above debug.
//!
//! RSA signatures are RSASSA-PSS: SHA-256 message digest, MGF1 with
//! SHA-256, salt length equal to the digest length. Ed25519 signatures are
//! the raw 64-byte form.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pss::Pss;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::digest::sha256_digest;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KeyType, PublicKey};

/// Signature algorithm, by the names update metadata uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
    #[serde(rename = "rsassa-pss")]
    RsaPss,
    #[serde(rename = "ed25519")]
    Ed25519,
}

impl SignatureMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureMethod::RsaPss => "rsassa-pss",
            SignatureMethod::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsassa-pss" => Ok(SignatureMethod::RsaPss),
            "ed25519" => Ok(SignatureMethod::Ed25519),
            other => Err(CryptoError::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

/// A detached signature with its declared method.
///
/// Metadata carries signatures as text; the constructors decode base64 or
/// hex transport into raw bytes. No length check happens here: shape
/// problems are the verifier's to answer, with a `false` verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    method: SignatureMethod,
    raw: Vec<u8>,
}

impl Signature {
    pub fn from_raw(method: SignatureMethod, raw: Vec<u8>) -> Self {
        Self { method, raw }
    }

    pub fn from_base64(method: SignatureMethod, text: &str) -> CryptoResult<Self> {
        let raw = BASE64
            .decode(text.trim())
            .map_err(|e| CryptoError::MalformedSignature {
                reason: format!("base64: {e}"),
            })?;
        Ok(Self { method, raw })
    }

    pub fn from_hex(method: SignatureMethod, text: &str) -> CryptoResult<Self> {
        let raw = hex::decode(text.trim()).map_err(|e| CryptoError::MalformedSignature {
            reason: format!("hex: {e}"),
        })?;
        Ok(Self { method, raw })
    }

    /// Decodes from either transport encoding found in update metadata.
    ///
    /// An even-length string of hex digits is taken as hex, anything else
    /// as base64. Callers that know the encoding should use [`from_base64`]
    /// or [`from_hex`] directly.
    ///
    /// [`from_base64`]: Signature::from_base64
    /// [`from_hex`]: Signature::from_hex
    pub fn from_encoded(method: SignatureMethod, text: &str) -> CryptoResult<Self> {
        let trimmed = text.trim();
        let looks_hex = !trimmed.is_empty()
            && trimmed.len() % 2 == 0
            && trimmed.bytes().all(|b| b.is_ascii_hexdigit());
        if looks_hex {
            Self::from_hex(method, trimmed)
        } else {
            Self::from_base64(method, trimmed)
        }
    }

    pub fn method(&self) -> SignatureMethod {
        self.method
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.raw)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.raw)
    }
}

/// Checks whether `signature` authenticates `message` under `key`.
///
/// A signature whose method does not match the key's algorithm is rejected
/// as `false` without attempting the wrong algorithm.
pub fn verify_signature(
    key: &PublicKey,
    signature: &Signature,
    message: &[u8],
) -> CryptoResult<bool> {
    if signature.method() != key.key_type().signature_method() {
        debug!(
            key_type = %key.key_type(),
            method = %signature.method(),
            "signature method does not match key type"
        );
        return Ok(false);
    }
    match key.key_type() {
        KeyType::Rsa => verify_rsa_pss(key.spki_der(), signature.raw_bytes(), message),
        KeyType::Ed25519 => verify_ed25519(key.spki_der(), signature.raw_bytes(), message),
    }
}

fn verify_rsa_pss(spki_der: &[u8], signature: &[u8], message: &[u8]) -> CryptoResult<bool> {
    let key = RsaPublicKey::from_public_key_der(spki_der).map_err(|e| CryptoError::MalformedKey {
        reason: format!("rsa public key: {e}"),
    })?;
    let hashed = sha256_digest(message);
    Ok(key.verify(Pss::new::<Sha256>(), &hashed, signature).is_ok())
}

fn verify_ed25519(spki_der: &[u8], signature: &[u8], message: &[u8]) -> CryptoResult<bool> {
    let key = VerifyingKey::from_public_key_der(spki_der).map_err(|e| CryptoError::MalformedKey {
        reason: format!("ed25519 public key: {e}"),
    })?;
    let Ok(signature) = Ed25519Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(key.verify(message, &signature).is_ok())
}

/// Signs `message` with RSASSA-PSS over SHA-256, salt length equal to the
/// digest length, so the output round-trips through [`verify_signature`].
///
/// Accepts a PKCS#8 or PKCS#1 PEM private key.
pub fn rsa_pss_sign(private_key_pem: &str, message: &[u8]) -> CryptoResult<Vec<u8>> {
    let trimmed = private_key_pem.trim();
    let key = RsaPrivateKey::from_pkcs8_pem(trimmed)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(trimmed))
        .map_err(|e| CryptoError::MalformedKey {
            reason: format!("rsa private key: {e}"),
        })?;
    let hashed = sha256_digest(message);
    key.sign_with_rng(&mut rand::thread_rng(), Pss::new::<Sha256>(), &hashed)
        .map_err(|e| CryptoError::MalformedKey {
            reason: format!("rsa private key unusable for signing: {e}"),
        })
}

/// Signs `message` with Ed25519.
///
/// Accepts a PKCS#8 PEM private key, or hex of the 32-byte seed or the
/// 64-byte keypair form.
pub fn ed25519_sign(private_key: &str, message: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = decode_ed25519_signing_key(private_key)?;
    Ok(key.sign(message).to_bytes().to_vec())
}

fn decode_ed25519_signing_key(private_key: &str) -> CryptoResult<SigningKey> {
    let trimmed = private_key.trim();
    if trimmed.starts_with("-----BEGIN") {
        return SigningKey::from_pkcs8_pem(trimmed).map_err(|e| CryptoError::MalformedKey {
            reason: format!("ed25519 private key: {e}"),
        });
    }
    let bytes = hex::decode(trimmed).map_err(|e| CryptoError::MalformedKey {
        reason: format!("ed25519 private key hex: {e}"),
    })?;
    match bytes.len() {
        32 => {
            let seed: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::MalformedKey {
                    reason: "ed25519 seed length".to_string(),
                })?;
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let keypair: [u8; 64] =
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::MalformedKey {
                        reason: "ed25519 keypair length".to_string(),
                    })?;
            SigningKey::from_keypair_bytes(&keypair).map_err(|e| CryptoError::MalformedKey {
                reason: format!("ed25519 keypair: {e}"),
            })
        }
        n => Err(CryptoError::MalformedKey {
            reason: format!("ed25519 private key must be 32 or 64 bytes, got {n}"),
        }),
    }
}
