//! Public key handling: typed algorithms, canonical encoding, fingerprints.
//!
//! Keys arrive from update metadata in whatever textual encoding the server
//! chose (PEM for RSA, raw hex or PEM for Ed25519). Construction validates
//! the material against the declared algorithm and normalizes it to
//! SubjectPublicKeyInfo DER, so a [`PublicKey`] value is always structurally
//! sound and two encodings of the same key are the same identity.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};

use crate::digest::sha256_digest;
use crate::error::{CryptoError, CryptoResult};
use crate::signing::SignatureMethod;

/// Public-key algorithms accepted in update metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Rsa,
    Ed25519,
}

impl KeyType {
    /// The signature method a key of this type verifies.
    pub fn signature_method(self) -> SignatureMethod {
        match self {
            KeyType::Rsa => SignatureMethod::RsaPss,
            KeyType::Ed25519 => SignatureMethod::Ed25519,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Rsa => "rsa",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" => Ok(KeyType::Rsa),
            "ed25519" => Ok(KeyType::Ed25519),
            other => Err(CryptoError::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

/// Stable key fingerprint: SHA-256 over the canonical SPKI encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId([u8; 32]);

impl KeyId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for KeyId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.hex())
    }
}

/// A verification key with its declared algorithm and derived fingerprint.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_type: KeyType,
    spki_der: Vec<u8>,
    key_id: KeyId,
}

impl PublicKey {
    /// Builds a key from textual material, validating it against the
    /// declared type.
    ///
    /// RSA accepts SubjectPublicKeyInfo or PKCS#1 PEM. Ed25519 accepts the
    /// raw 32-byte point as hex, or SubjectPublicKeyInfo PEM.
    pub fn new(key_type: KeyType, material: &str) -> CryptoResult<Self> {
        let spki_der = match key_type {
            KeyType::Rsa => decode_rsa_material(material)?,
            KeyType::Ed25519 => decode_ed25519_material(material)?,
        };
        Ok(Self::from_parts(key_type, spki_der))
    }

    /// Builds a key from its canonical SubjectPublicKeyInfo encoding.
    pub fn from_spki_der(key_type: KeyType, spki_der: &[u8]) -> CryptoResult<Self> {
        match key_type {
            KeyType::Rsa => {
                RsaPublicKey::from_public_key_der(spki_der).map_err(|e| {
                    CryptoError::MalformedKey {
                        reason: format!("rsa public key: {e}"),
                    }
                })?;
            }
            KeyType::Ed25519 => {
                VerifyingKey::from_public_key_der(spki_der).map_err(|e| {
                    CryptoError::MalformedKey {
                        reason: format!("ed25519 public key: {e}"),
                    }
                })?;
            }
        }
        Ok(Self::from_parts(key_type, spki_der.to_vec()))
    }

    fn from_parts(key_type: KeyType, spki_der: Vec<u8>) -> Self {
        let key_id = KeyId::from(sha256_digest(&spki_der));
        Self {
            key_type,
            spki_der,
            key_id,
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// Canonical SubjectPublicKeyInfo DER, the bytes the fingerprint covers.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Re-encodes the key as SubjectPublicKeyInfo PEM.
    pub fn to_pem(&self) -> CryptoResult<String> {
        let pem = match self.key_type {
            KeyType::Rsa => RsaPublicKey::from_public_key_der(&self.spki_der)
                .and_then(|key| key.to_public_key_pem(LineEnding::LF)),
            KeyType::Ed25519 => VerifyingKey::from_public_key_der(&self.spki_der)
                .and_then(|key| key.to_public_key_pem(LineEnding::LF)),
        };
        pem.map_err(|e| CryptoError::MalformedKey {
            reason: format!("{}: {e}", self.key_type),
        })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_type", &self.key_type)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

fn decode_rsa_material(material: &str) -> CryptoResult<Vec<u8>> {
    let trimmed = material.trim();
    let key = RsaPublicKey::from_public_key_pem(trimmed)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed))
        .map_err(|e| CryptoError::MalformedKey {
            reason: format!("rsa public key: {e}"),
        })?;
    let der = key.to_public_key_der().map_err(|e| CryptoError::MalformedKey {
        reason: format!("rsa public key: {e}"),
    })?;
    Ok(der.into_vec())
}

fn decode_ed25519_material(material: &str) -> CryptoResult<Vec<u8>> {
    let trimmed = material.trim();
    let key = if trimmed.starts_with("-----BEGIN") {
        VerifyingKey::from_public_key_pem(trimmed).map_err(|e| CryptoError::MalformedKey {
            reason: format!("ed25519 public key: {e}"),
        })?
    } else {
        let bytes = hex::decode(trimmed).map_err(|e| CryptoError::MalformedKey {
            reason: format!("ed25519 public key hex: {e}"),
        })?;
        let point: [u8; 32] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::MalformedKey {
                    reason: format!("ed25519 public key must be 32 bytes, got {}", bytes.len()),
                })?;
        VerifyingKey::from_bytes(&point).map_err(|e| CryptoError::MalformedKey {
            reason: format!("ed25519 public key: {e}"),
        })?
    };
    let der = key.to_public_key_der().map_err(|e| CryptoError::MalformedKey {
        reason: format!("ed25519 public key: {e}"),
    })?;
    Ok(der.into_vec())
}
