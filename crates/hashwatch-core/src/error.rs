//! Error types for the digest engine, the change monitor and settings.

use crate::algorithm::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("file not found or unreadable: {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed for {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("reference is not a valid {algorithm} digest: expected {expected_len} hex characters, got {actual_len}")]
    MalformedReference {
        algorithm: HashAlgorithm,
        expected_len: usize,
        actual_len: usize,
    },
}

/// Plain failure category, carried in monitor events where the full error
/// (and its `io::Error` source) cannot be cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestErrorKind {
    NotFound,
    ReadError,
    UnsupportedAlgorithm,
    MalformedReference,
}

impl DigestError {
    pub fn kind(&self) -> DigestErrorKind {
        match self {
            DigestError::NotFound { .. } => DigestErrorKind::NotFound,
            DigestError::ReadError { .. } => DigestErrorKind::ReadError,
            DigestError::UnsupportedAlgorithm(_) => DigestErrorKind::UnsupportedAlgorithm,
            DigestError::MalformedReference { .. } => DigestErrorKind::MalformedReference,
        }
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("baseline digest failed: {0}")]
    Baseline(#[from] DigestError),

    #[error("already watching {}", .0.display())]
    AlreadyWatching(PathBuf),

    #[error("no parent directory for {}", .0.display())]
    NoParent(PathBuf),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to spawn monitor thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("cannot determine config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, DigestError>;
