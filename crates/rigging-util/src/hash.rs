use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 hash of a file, returning a lowercase hex string.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 hash of a byte slice, returning a lowercase hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Extract the digest from a checksum sidecar.
///
/// Sidecars are either a bare digest or `sha256sum` output (`<digest>  <file>`).
pub fn sidecar_digest(content: &str) -> Option<&str> {
    content
        .split_whitespace()
        .next()
        .filter(|d| d.len() == 64 && d.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Check a file against an expected SHA-256 digest (case-insensitive).
pub fn verify_sha256(path: &Path, expected: &str) -> std::io::Result<bool> {
    Ok(sha256_file(path)?.eq_ignore_ascii_case(expected))
}
