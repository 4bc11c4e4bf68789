//! Streaming digest engine.
//!
//! Files are read in fixed-size chunks and fed through the selected hash
//! function, so memory use does not depend on file size.

use crate::algorithm::HashAlgorithm;
use crate::error::{DigestError, Result};
use ::digest::DynDigest as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Read buffer size for streaming.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A lowercase hex digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl Digest {
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Compare against a reference string. Hex is case-insensitive and
    /// surrounding whitespace is ignored.
    pub fn matches(&self, reference: &str) -> bool {
        self.hex.eq_ignore_ascii_case(reference.trim())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Hash everything `reader` yields. Returns the digest and the number of
/// bytes consumed.
pub fn digest_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<(Digest, u64)> {
    let mut hasher = algorithm.hasher();
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    let digest = Digest {
        algorithm,
        hex: hex::encode(hasher.finalize()),
    };
    Ok((digest, total))
}

/// Compute the digest of the file at `path`.
pub fn compute_digest(path: &Path, algorithm: HashAlgorithm) -> Result<Digest> {
    let file = File::open(path).map_err(|source| DigestError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let (digest, bytes) = digest_reader(file, algorithm).map_err(|source| DigestError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), %algorithm, bytes, "digest computed");
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestErrorKind;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    const HELLO: &[u8] = b"hello world";

    #[test]
    fn known_answers_for_hello_world() {
        let cases = [
            (
                HashAlgorithm::Sha256,
                "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
            ),
            (HashAlgorithm::Sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"),
            (
                HashAlgorithm::Sha512,
                "309ecc489c12d6eb4cc40f50c902f2b4d0ed77ee511a7c7a9bcd3ca86d4cd86f\
                 989dd35bc5ff499670da34255b45b0cfd830e81f605dcf7dc5542e93ae9cd76f",
            ),
            (HashAlgorithm::Md5, "5eb63bbbe01eeed093cb22bb8f5acdc3"),
        ];
        for (alg, expected) in cases {
            let (digest, bytes) = digest_reader(Cursor::new(HELLO), alg).unwrap();
            assert_eq!(digest.hex, expected, "{alg}");
            assert_eq!(digest.hex.len(), alg.digest_len());
            assert_eq!(bytes, HELLO.len() as u64);
        }
    }

    #[test]
    fn empty_input() {
        let (digest, bytes) = digest_reader(Cursor::new(b""), HashAlgorithm::Sha256).unwrap();
        assert_eq!(
            digest.hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(bytes, 0);
        let (digest, _) = digest_reader(Cursor::new(b""), HashAlgorithm::Md5).unwrap();
        assert_eq!(digest.hex, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn multi_chunk_file_matches_one_shot_hash() {
        use sha2::Digest as _;

        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        // Not a multiple of the chunk size, so the last read is short.
        let data: Vec<u8> = (0..(CHUNK_SIZE * 37 + 123)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let digest = compute_digest(&path, HashAlgorithm::Sha256).unwrap();
        assert_eq!(digest.hex, hex::encode(sha2::Sha256::digest(&data)));
    }

    #[test]
    fn deterministic_on_unmodified_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"some content").unwrap();
        for alg in HashAlgorithm::ALL {
            let a = compute_digest(&path, alg).unwrap();
            let b = compute_digest(&path, alg).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = compute_digest(Path::new("/nonexistent/path"), HashAlgorithm::Sha256).unwrap_err();
        assert_eq!(err.kind(), DigestErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn directory_is_read_error() {
        let dir = tempdir().unwrap();
        let err = compute_digest(dir.path(), HashAlgorithm::Sha256).unwrap_err();
        assert_eq!(err.kind(), DigestErrorKind::ReadError);
    }

    #[test]
    fn matches_is_case_insensitive() {
        let (digest, _) = digest_reader(Cursor::new(HELLO), HashAlgorithm::Md5).unwrap();
        assert!(digest.matches("5EB63BBBE01EEED093CB22BB8F5ACDC3"));
        assert!(digest.matches(" 5eb63bbbe01eeed093cb22bb8f5acdc3\n"));
        assert!(!digest.matches("deadbeef"));
    }
}
