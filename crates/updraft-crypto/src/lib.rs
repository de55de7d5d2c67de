//! Trust primitives for the updraft over-the-air update client.
//!
//! Three stateless building blocks, shared by the metadata and provisioning
//! layers:
//!
//! - Digest engine: SHA-256/SHA-512 over byte slices or readers
//! - Signature verifier: RSASSA-PSS (SHA-256) and Ed25519, dispatched on
//!   the key's declared algorithm
//! - Credential bundle extractor: PKCS#12 archives from provisioning,
//!   staged in memory and committed to caller sinks as PEM
//!
//! Verdicts are plain booleans. `Err` is reserved for ill-posed questions:
//! unparseable keys, unknown algorithms, unreadable archives, unusable
//! sinks. Nothing here retries, caches, or keeps global state; callers
//! decide what a verdict means for the update in flight.
//!
//! # Quick start
//!
//! ```no_run
//! use updraft_crypto::{verify_signature, KeyType, PublicKey, Signature, SignatureMethod};
//!
//! # fn main() -> updraft_crypto::CryptoResult<()> {
//! let key = PublicKey::new(
//!     KeyType::Ed25519,
//!     "fc51cd8e6218a1a38da47ed00230f0580816ed13ba3303ac5deb911548908025",
//! )?;
//! let signature = Signature::from_encoded(
//!     SignatureMethod::Ed25519,
//!     "6291d657deec24024827e69c3abe01a30ce548a284743a445e3680d7db5ac3ac\
//!      18ff9b538d16f290ae67f760984dc6594a7c15e9716ed28dc027beceea1ec40a",
//! )?;
//! if verify_signature(&key, &signature, &[0xaf, 0x82])? {
//!     println!("metadata accepted from {}", key.key_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod digest;
pub mod error;
pub mod key;
pub mod signing;

pub use bundle::{extract_credentials, extract_credentials_to_files, CredentialBundle};
pub use digest::{sha256_digest, sha256_reader, sha512_digest, sha512_reader};
pub use error::{CryptoError, CryptoResult};
pub use key::{KeyId, KeyType, PublicKey};
pub use signing::{ed25519_sign, rsa_pss_sign, verify_signature, Signature, SignatureMethod};
