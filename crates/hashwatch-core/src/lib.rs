//! File integrity verification and change monitoring.
//!
//! - [`compute_digest`] streams a file through one of the supported hash
//!   functions.
//! - [`verify`] compares a file against a known digest.
//! - [`MonitorSession`] watches a verified file and reports each
//!   notification as `Changed`, `Unchanged` or `Error`.

pub mod algorithm;
pub mod digest;
pub mod error;
pub mod monitor;
pub mod paths;
pub mod settings;
pub mod verify;

use std::path::Path;

pub use self::algorithm::HashAlgorithm;
pub use self::digest::{compute_digest, digest_reader, Digest, CHUNK_SIZE};
pub use self::error::{ConfigError, DigestError, DigestErrorKind, MonitorError};
pub use self::monitor::{MonitorConfig, MonitorEvent, MonitorSession, MonitorState};
pub use self::settings::Settings;
pub use self::verify::{verify, VerificationReason, VerificationResult};

/// Start monitoring `path` with the default monitor configuration.
pub fn start_monitor<F>(
    path: &Path,
    algorithm: HashAlgorithm,
    on_event: F,
) -> Result<MonitorSession, MonitorError>
where
    F: FnMut(MonitorEvent) + Send + 'static,
{
    MonitorSession::start(path, algorithm, &MonitorConfig::default(), on_event)
}

/// Stop a session. Safe to call more than once.
pub fn stop_monitor(session: &MonitorSession) {
    session.stop();
}
