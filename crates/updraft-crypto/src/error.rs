//! Error type shared by the digest, verification, and extraction paths.
//!
//! A `false` verdict from the verifier is not an error. `CryptoError` means
//! the question itself was ill-posed: the key does not parse, the algorithm
//! is unknown, the archive is not an archive, or a sink cannot be written.

use thiserror::Error;

/// Convenience alias for fallible crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material is not a structurally valid key of its declared type.
    #[error("malformed key: {reason}")]
    MalformedKey { reason: String },

    /// The algorithm name is outside the supported set.
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Signature text did not decode to bytes, so there was nothing to check.
    #[error("malformed signature encoding: {reason}")]
    MalformedSignature { reason: String },

    /// The credential bundle is not a parseable PKCS#12 archive.
    #[error("malformed credential bundle: {reason}")]
    MalformedBundle { reason: String },

    /// The bundle failed its integrity or decryption checks. A wrong
    /// password and a corrupted payload are indistinguishable here.
    #[error("credential bundle decryption failed")]
    DecryptionFailed,

    /// The bundle decrypted cleanly but lacks a required artifact.
    #[error("credential bundle is missing its {missing}")]
    IncompleteBundle { missing: &'static str },

    /// An extraction output was requested without a usable sink.
    #[error("no sink supplied for the {output} output")]
    MissingSink { output: &'static str },

    /// A sink could not be created or written.
    #[error("failed to write the {output} output")]
    SinkWrite {
        output: &'static str,
        #[source]
        source: std::io::Error,
    },
}
