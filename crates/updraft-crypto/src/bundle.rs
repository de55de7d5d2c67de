//! Credential bundle extraction.
//!
//! Provisioning hands the client one PKCS#12 archive holding the device
//! private key, the client certificate, and the CA chain. Extraction is
//! transactional: all three artifacts are staged in memory as PEM, and only
//! then committed to the caller's sinks. A staging failure touches nothing.
//!
//! Content errors (not an archive, wrong password, missing artifact) and
//! resource errors (missing or unwritable sink) are distinct variants, so
//! callers can tell a corrupt download from a full disk.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use openssl::error::ErrorStack;
use openssl::pkcs12::Pkcs12;
use tracing::debug;

use crate::error::{CryptoError, CryptoResult};

/// PEM artifacts staged from a PKCS#12 credential archive.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    private_key_pem: String,
    certificate_pem: String,
    ca_chain_pem: String,
}

// Debug omits the private key material.
impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("certificate_pem", &self.certificate_pem)
            .field("ca_chain_pem", &self.ca_chain_pem)
            .finish_non_exhaustive()
    }
}

impl CredentialBundle {
    /// Parses and decrypts a PKCS#12 archive.
    ///
    /// The password may legitimately be empty; that is a password, not the
    /// absence of one. The archive must contain a private key and a client
    /// certificate. The CA chain may hold zero certificates, in which case
    /// [`ca_chain_pem`] is the empty string.
    ///
    /// [`ca_chain_pem`]: CredentialBundle::ca_chain_pem
    pub fn from_pkcs12(bundle: &[u8], password: &str) -> CryptoResult<Self> {
        let archive = Pkcs12::from_der(bundle).map_err(|e| CryptoError::MalformedBundle {
            reason: e.to_string(),
        })?;
        let parsed = archive.parse2(password).map_err(|e| {
            debug!(error = %e, "credential archive failed decryption");
            CryptoError::DecryptionFailed
        })?;

        let pkey = parsed.pkey.ok_or(CryptoError::IncompleteBundle {
            missing: "private key",
        })?;
        let cert = parsed.cert.ok_or(CryptoError::IncompleteBundle {
            missing: "client certificate",
        })?;

        let private_key_pem = pem_string(pkey.private_key_to_pem_pkcs8().map_err(content_err)?)?;
        let certificate_pem = pem_string(cert.to_pem().map_err(content_err)?)?;

        let mut ca_chain_pem = String::new();
        let mut ca_certs = 0usize;
        if let Some(chain) = parsed.ca {
            for ca in chain.iter() {
                ca_chain_pem.push_str(&pem_string(ca.to_pem().map_err(content_err)?)?);
                ca_certs += 1;
            }
        }
        debug!(ca_certs, "staged credential bundle");

        Ok(Self {
            private_key_pem,
            certificate_pem,
            ca_chain_pem,
        })
    }

    /// Device private key as PKCS#8 PEM.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// Client certificate as X.509 PEM.
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// CA chain as concatenated X.509 PEM, empty when the archive carried
    /// no extra certificates.
    pub fn ca_chain_pem(&self) -> &str {
        &self.ca_chain_pem
    }

    /// Commits the staged artifacts to the three sinks.
    pub fn write_to<K, C, A>(
        &self,
        key_sink: &mut K,
        cert_sink: &mut C,
        ca_sink: &mut A,
    ) -> CryptoResult<()>
    where
        K: Write,
        C: Write,
        A: Write,
    {
        write_pem(key_sink, "private key", &self.private_key_pem)?;
        write_pem(cert_sink, "certificate", &self.certificate_pem)?;
        write_pem(ca_sink, "ca chain", &self.ca_chain_pem)?;
        Ok(())
    }
}

/// Extracts a credential archive to three writable sinks.
///
/// Stages everything first; the sinks see no bytes unless the whole archive
/// parsed, decrypted, and yielded all required artifacts.
pub fn extract_credentials<K, C, A>(
    bundle: &[u8],
    password: &str,
    key_sink: &mut K,
    cert_sink: &mut C,
    ca_sink: &mut A,
) -> CryptoResult<()>
where
    K: Write,
    C: Write,
    A: Write,
{
    CredentialBundle::from_pkcs12(bundle, password)?.write_to(key_sink, cert_sink, ca_sink)
}

/// Extracts a credential archive to three files.
///
/// All three outputs are required: an empty path is refused up front,
/// before the archive is even parsed. Files are created only after staging
/// succeeded; the private key file is created with mode 0o600 on unix.
pub fn extract_credentials_to_files(
    bundle: &[u8],
    password: &str,
    key_path: &Path,
    cert_path: &Path,
    ca_path: &Path,
) -> CryptoResult<()> {
    require_path(key_path, "private key")?;
    require_path(cert_path, "certificate")?;
    require_path(ca_path, "ca chain")?;

    let staged = CredentialBundle::from_pkcs12(bundle, password)?;

    let mut key_file = create_key_sink(key_path)?;
    restrict_to_owner(&key_file).map_err(|source| CryptoError::SinkWrite {
        output: "private key",
        source,
    })?;
    let mut cert_file = create_sink(cert_path, "certificate")?;
    let mut ca_file = create_sink(ca_path, "ca chain")?;

    staged.write_to(&mut key_file, &mut cert_file, &mut ca_file)
}

fn require_path(path: &Path, output: &'static str) -> CryptoResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CryptoError::MissingSink { output });
    }
    Ok(())
}

fn create_sink(path: &Path, output: &'static str) -> CryptoResult<File> {
    File::create(path).map_err(|source| CryptoError::SinkWrite { output, source })
}

// The key file is never observable with open permissions: it is created
// with mode 0o600 straight away, not restricted after the fact.
#[cfg(unix)]
fn create_key_sink(path: &Path) -> CryptoResult<File> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|source| CryptoError::SinkWrite {
            output: "private key",
            source,
        })
}

#[cfg(not(unix))]
fn create_key_sink(path: &Path) -> CryptoResult<File> {
    create_sink(path, "private key")
}

// The creation mode does not apply to a file that already existed; this
// restricts it after open.
#[cfg(unix)]
fn restrict_to_owner(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = file.metadata()?.permissions();
    perms.set_mode(0o600);
    file.set_permissions(perms)
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &File) -> std::io::Result<()> {
    Ok(())
}

fn write_pem<W: Write>(sink: &mut W, output: &'static str, pem: &str) -> CryptoResult<()> {
    sink.write_all(pem.as_bytes())
        .and_then(|()| sink.flush())
        .map_err(|source| CryptoError::SinkWrite { output, source })
}

fn pem_string(bytes: Vec<u8>) -> CryptoResult<String> {
    String::from_utf8(bytes).map_err(|e| CryptoError::MalformedBundle {
        reason: e.to_string(),
    })
}

fn content_err(e: ErrorStack) -> CryptoError {
    CryptoError::MalformedBundle {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Writer that fails every write, for sink error paths.
    struct FailWriter;

    impl Write for FailWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn staged() -> CredentialBundle {
        CredentialBundle {
            private_key_pem: "key pem\n".to_string(),
            certificate_pem: "cert pem\n".to_string(),
            ca_chain_pem: String::new(),
        }
    }

    #[test]
    fn test_non_archive_input_is_malformed() {
        let err = CredentialBundle::from_pkcs12(b"This is thoroughly not an archive", "")
            .unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle { .. }));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = CredentialBundle::from_pkcs12(b"", "password").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle { .. }));
    }

    #[test]
    fn test_failing_sink_is_sink_write() {
        let bundle = staged();
        let mut key_sink = Vec::new();
        let mut ca_sink = Vec::new();
        let err = bundle
            .write_to(&mut key_sink, &mut FailWriter, &mut ca_sink)
            .unwrap_err();
        assert!(matches!(
            err,
            CryptoError::SinkWrite {
                output: "certificate",
                ..
            }
        ));
        // ca sink was never reached.
        assert!(ca_sink.is_empty());
    }

    #[test]
    fn test_empty_path_refused_before_parsing() {
        // Garbage bundle bytes, but the sink check comes first.
        let err = extract_credentials_to_files(
            b"garbage",
            "",
            Path::new(""),
            Path::new("/tmp/cert.pem"),
            Path::new("/tmp/ca.pem"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CryptoError::MissingSink {
                output: "private key"
            }
        ));
    }
}
