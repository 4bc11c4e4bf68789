//! Integrity comparator: one digest computation, one verdict.

use crate::algorithm::HashAlgorithm;
use crate::digest::{compute_digest, Digest};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationReason {
    Match,
    Mismatch,
    Unreadable,
}

/// Outcome of a single `verify` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub reason: VerificationReason,
    /// The freshly computed digest, absent when the file could not be read.
    pub computed: Option<Digest>,
    /// Error text or a note about the reference, for display only.
    pub detail: Option<String>,
}

impl VerificationResult {
    pub fn message(&self) -> &'static str {
        match self.reason {
            VerificationReason::Match => "File integrity check passed!",
            VerificationReason::Mismatch => "File integrity check failed!",
            VerificationReason::Unreadable => "File not found or unreadable",
        }
    }
}

/// Hash `path` and compare it with `reference`.
///
/// Never fails: engine errors collapse into `Unreadable`. A reference that is
/// not a well-formed digest for `algorithm` can never match and is reported
/// as `Mismatch` with an explanation in `detail`.
pub fn verify(path: &Path, reference: &str, algorithm: HashAlgorithm) -> VerificationResult {
    let computed = match compute_digest(path, algorithm) {
        Ok(d) => d,
        Err(e) => {
            warn!(path = %path.display(), %algorithm, error = %e, "verification could not read file");
            return VerificationResult {
                passed: false,
                reason: VerificationReason::Unreadable,
                computed: None,
                detail: Some(e.to_string()),
            };
        }
    };

    if computed.matches(reference) {
        info!(path = %path.display(), %algorithm, "integrity check passed");
        return VerificationResult {
            passed: true,
            reason: VerificationReason::Match,
            computed: Some(computed),
            detail: None,
        };
    }

    let detail = algorithm.validate_reference(reference).err().map(|e| e.to_string());
    warn!(
        path = %path.display(),
        %algorithm,
        expected = reference.trim(),
        actual = %computed,
        "integrity check failed"
    );
    VerificationResult {
        passed: false,
        reason: VerificationReason::Mismatch,
        computed: Some(computed),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn round_trip_matches_for_every_algorithm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        fs::write(&path, b"payload bytes").unwrap();

        for alg in HashAlgorithm::ALL {
            let digest = compute_digest(&path, alg).unwrap();
            let result = verify(&path, digest.as_hex(), alg);
            assert!(result.passed, "{alg}");
            assert_eq!(result.reason, VerificationReason::Match);
            assert_eq!(result.computed.as_ref(), Some(&digest));

            let upper = verify(&path, &digest.as_hex().to_uppercase(), alg);
            assert_eq!(upper.reason, VerificationReason::Match);
        }
    }

    #[test]
    fn wrong_digest_is_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        fs::write(&path, b"payload bytes").unwrap();

        let reference = "deadbeef".repeat(8);
        let result = verify(&path, &reference, HashAlgorithm::Sha256);
        assert!(!result.passed);
        assert_eq!(result.reason, VerificationReason::Mismatch);
        assert!(result.computed.is_some());
        // Well-formed reference, so nothing to explain.
        assert!(result.detail.is_none());
        assert_eq!(result.message(), "File integrity check failed!");
    }

    #[test]
    fn malformed_reference_is_mismatch_with_detail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        fs::write(&path, b"payload bytes").unwrap();

        let result = verify(&path, "deadbeef", HashAlgorithm::Sha256);
        assert_eq!(result.reason, VerificationReason::Mismatch);
        let detail = result.detail.unwrap();
        assert!(detail.contains("expected 64"), "{detail}");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let result = verify(&dir.path().join("gone.txt"), "00", HashAlgorithm::Md5);
        assert!(!result.passed);
        assert_eq!(result.reason, VerificationReason::Unreadable);
        assert!(result.computed.is_none());
        assert!(result.detail.is_some());
        assert_eq!(result.message(), "File not found or unreadable");
    }
}
