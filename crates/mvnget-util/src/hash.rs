use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Digest algorithms published as Maven checksum sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Sidecar file extension without the leading dot (`md5`, `sha1`, `sha256`).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Lowercase hex digest of a file.
    pub fn hex_file(self, path: &Path) -> std::io::Result<String> {
        match self {
            Self::Md5 => digest_file::<Md5>(path),
            Self::Sha1 => digest_file::<Sha1>(path),
            Self::Sha256 => digest_file::<Sha256>(path),
        }
    }

    /// Lowercase hex digest of a byte slice.
    pub fn hex_bytes(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => digest_bytes::<Md5>(data),
            Self::Sha1 => digest_bytes::<Sha1>(data),
            Self::Sha256 => digest_bytes::<Sha256>(data),
        }
    }
}

fn digest_file<D: Digest>(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn digest_bytes<D: Digest>(data: &[u8]) -> String {
    let mut hasher = D::new();
    hasher.update(data);
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
