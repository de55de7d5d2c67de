//! SHA-2 digests over update artifacts.
//!
//! Raw bytes out; callers hex-encode for display or comparison against
//! metadata. The reader variants hash in fixed-size chunks so downloaded
//! images never need to be held in memory whole.

use std::io::Read;

use sha2::{Digest, Sha256, Sha512};

const READ_BUF_SIZE: usize = 8192;

/// SHA-256 of a byte slice. Total: empty input is a valid input.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-512 of a byte slice.
pub fn sha512_digest(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// SHA-256 of everything a reader yields.
pub fn sha256_reader<R: Read>(reader: &mut R) -> std::io::Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// SHA-512 of everything a reader yields.
pub fn sha512_reader<R: Read>(reader: &mut R) -> std::io::Result<[u8; 64]> {
    let mut hasher = Sha512::new();
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    Ok(out)
}
