use crate::error::DigestError;
use ::digest::DynDigest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of hash functions a digest can be computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha1,
    Sha512,
    Md5,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha512,
        HashAlgorithm::Md5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Length of the lowercase hex digest.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha512 => 128,
            HashAlgorithm::Md5 => 32,
        }
    }

    pub(crate) fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            HashAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            HashAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            HashAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
            HashAlgorithm::Md5 => Box::new(md5::Md5::default()),
        }
    }

    /// Check that `reference` looks like a digest this algorithm produces:
    /// the right number of characters, all hex. Case and surrounding
    /// whitespace are ignored.
    pub fn validate_reference(self, reference: &str) -> Result<(), DigestError> {
        let trimmed = reference.trim();
        let expected_len = self.digest_len();
        if trimmed.len() != expected_len || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DigestError::MalformedReference {
                algorithm: self,
                expected_len,
                actual_len: trimmed.chars().count(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            _ => Err(DigestError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestErrorKind;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("Sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        for alg in HashAlgorithm::ALL {
            assert_eq!(alg.to_string().parse::<HashAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let err = "blake3".parse::<HashAlgorithm>().unwrap_err();
        assert_eq!(err.kind(), DigestErrorKind::UnsupportedAlgorithm);
    }

    #[test]
    fn validate_reference_checks_length_and_charset() {
        let good = "5eb63bbbe01eeed093cb22bb8f5acdc3";
        assert!(HashAlgorithm::Md5.validate_reference(good).is_ok());
        assert!(HashAlgorithm::Md5
            .validate_reference(&format!("  {}\n", good.to_uppercase()))
            .is_ok());

        match HashAlgorithm::Sha256.validate_reference(good) {
            Err(DigestError::MalformedReference {
                expected_len,
                actual_len,
                ..
            }) => {
                assert_eq!(expected_len, 64);
                assert_eq!(actual_len, 32);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let not_hex = "z".repeat(32);
        assert!(HashAlgorithm::Md5.validate_reference(&not_hex).is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&HashAlgorithm::Sha512).unwrap();
        assert_eq!(json, "\"sha512\"");
        let alg: HashAlgorithm = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(alg, HashAlgorithm::Md5);
    }
}
