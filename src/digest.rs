//! Content digests and the digest-gated archive cache.
//!
//! Downloaded archives are cached under the basename of their source URL.
//! The location is only a convention; validity is decided by comparing the
//! file's SHA-256 against the digest the catalog declares for that URL.

use crate::error::AcquireError;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the lowercase hex SHA-256 of a file's full contents.
pub fn sha256_file(path: &Path) -> Result<String, AcquireError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Whether the file's contents hash to `expected` (hex, case-insensitive).
pub fn verify(path: &Path, expected: &str) -> Result<bool, AcquireError> {
    Ok(sha256_file(path)? == expected.to_lowercase())
}

/// The conventional cache location for a file downloaded from `url`:
/// the basename of the URL's path, under `cache_dir`.
pub fn cached_path_for(cache_dir: &Path, url: &str) -> PathBuf {
    cache_dir.join(url_basename(url))
}

/// Last path segment of a URL, with query string and fragment stripped.
fn url_basename(url: &str) -> String {
    let clean = url.split(['?', '#']).next().unwrap_or(url);

    clean
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA256 of "hello world"
    const HELLO_SHA: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_file_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, b"hello world").unwrap();

        assert_eq!(sha256_file(&file).unwrap(), HELLO_SHA);
    }

    #[test]
    fn test_verify_match_and_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, b"hello world").unwrap();

        assert!(verify(&file, HELLO_SHA).unwrap());
        assert!(!verify(&file, &HELLO_SHA.replace('b', "c")).unwrap());
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, b"hello world").unwrap();

        assert!(verify(&file, &HELLO_SHA.to_uppercase()).unwrap());
    }

    #[test]
    fn test_verify_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert!(matches!(
            verify(&missing, HELLO_SHA),
            Err(AcquireError::Io(_))
        ));
    }

    #[test]
    fn test_cached_path_uses_url_basename() {
        let cache = Path::new("/tmp");
        assert_eq!(
            cached_path_for(cache, "https://x.example/dl/lib-8.0.tgz"),
            Path::new("/tmp/lib-8.0.tgz")
        );
        assert_eq!(
            cached_path_for(cache, "https://x.example/dl/lib.zip?token=abc#frag"),
            Path::new("/tmp/lib.zip")
        );
        assert_eq!(
            cached_path_for(cache, "https://x.example/"),
            Path::new("/tmp/download")
        );
    }
}
