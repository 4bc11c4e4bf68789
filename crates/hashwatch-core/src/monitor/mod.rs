//! Change monitor for a single file.
//!
//! A session registers a non-recursive watch on the file's directory and
//! hands every notification to a dedicated worker thread. The worker owns the
//! last-known digest, re-hashes the file for each notification about the
//! target and reports whether the content actually changed. Notifications for
//! sibling files are dropped without a report.
//!
//! Readers never see `last_digest` directly; they only get `MonitorEvent`s.

mod watcher;

use crate::algorithm::HashAlgorithm;
use crate::digest::{compute_digest, Digest};
use crate::error::{DigestError, DigestErrorKind, MonitorError};
use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc as async_mpsc;
use tracing::{debug, info, trace, warn};

use self::watcher::Signal;

/// Report produced for each accepted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    Changed {
        path: PathBuf,
        previous: Digest,
        current: Digest,
    },
    Unchanged {
        path: PathBuf,
        digest: Digest,
    },
    Error {
        path: PathBuf,
        kind: DigestErrorKind,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    Watching,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll instead of using OS notifications.
    pub use_polling: bool,
    /// Interval for the polling backend.
    pub poll_interval_ms: u64,
    /// End the session when the file disappears instead of waiting for it to
    /// come back.
    pub stop_on_missing: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            use_polling: false,
            poll_interval_ms: 2000,
            stop_on_missing: false,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ── watched path registry ───────────────────────────────────────────────────

fn active_paths() -> &'static Mutex<HashSet<PathBuf>> {
    static ACTIVE: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Exclusive claim on a canonical path, released on drop.
struct PathClaim(PathBuf);

impl PathClaim {
    fn acquire(path: &Path) -> Result<Self, MonitorError> {
        if !active_paths().lock().insert(path.to_path_buf()) {
            return Err(MonitorError::AlreadyWatching(path.to_path_buf()));
        }
        Ok(Self(path.to_path_buf()))
    }
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        active_paths().lock().remove(&self.0);
    }
}

// ── session ─────────────────────────────────────────────────────────────────

struct Control {
    watcher: Box<dyn Watcher + Send>,
    tx: mpsc::Sender<Signal>,
    worker: JoinHandle<()>,
    _claim: PathClaim,
}

/// Slot shared by the handle and the worker; whoever ends the session first
/// takes the `Control` out and releases it.
type ControlSlot = Arc<Mutex<Option<Control>>>;

/// Handle to a running monitor. Dropping it stops the monitor.
pub struct MonitorSession {
    path: PathBuf,
    algorithm: HashAlgorithm,
    baseline: Digest,
    stopped: Arc<AtomicBool>,
    control: ControlSlot,
}

impl MonitorSession {
    /// Compute the baseline digest and start watching `path`. `on_event` runs
    /// on the monitor's worker thread, once per accepted notification, in
    /// delivery order.
    pub fn start<F>(
        path: &Path,
        algorithm: HashAlgorithm,
        config: &MonitorConfig,
        on_event: F,
    ) -> Result<Self, MonitorError>
    where
        F: FnMut(MonitorEvent) + Send + 'static,
    {
        let target = path.canonicalize().map_err(|source| DigestError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = target
            .parent()
            .ok_or_else(|| MonitorError::NoParent(target.clone()))?
            .to_path_buf();

        let claim = PathClaim::acquire(&target)?;
        let baseline = compute_digest(&target, algorithm)?;

        let (tx, rx) = mpsc::channel();
        let mut watcher = watcher::build_watcher(tx.clone(), config)?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let stopped = Arc::new(AtomicBool::new(false));
        let control: ControlSlot = Arc::new(Mutex::new(None));
        let worker = Worker {
            path: target.clone(),
            algorithm,
            last_digest: baseline.clone(),
            stop_on_missing: config.stop_on_missing,
            stopped: stopped.clone(),
            control: control.clone(),
            on_event,
        };

        // Held across the spawn so a worker that ends the session early
        // always finds the control in place.
        {
            let mut slot = control.lock();
            let handle = thread::Builder::new()
                .name("hashwatch-monitor".into())
                .spawn(move || worker.run(rx))
                .map_err(MonitorError::Spawn)?;
            *slot = Some(Control {
                watcher,
                tx,
                worker: handle,
                _claim: claim,
            });
        }

        info!(path = %target.display(), %algorithm, baseline = %baseline, "monitoring started");

        Ok(Self {
            path: target,
            algorithm,
            baseline,
            stopped,
            control,
        })
    }

    /// Like `start`, but events arrive on an async channel.
    pub fn start_channel(
        path: &Path,
        algorithm: HashAlgorithm,
        config: &MonitorConfig,
    ) -> Result<(Self, async_mpsc::UnboundedReceiver<MonitorEvent>), MonitorError> {
        let (tx, rx) = async_mpsc::unbounded_channel();
        let session = Self::start(path, algorithm, config, move |event| {
            let _ = tx.send(event);
        })?;
        Ok((session, rx))
    }

    /// Canonical path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest computed when the session started.
    pub fn baseline(&self) -> &Digest {
        &self.baseline
    }

    pub fn state(&self) -> MonitorState {
        if self.stopped.load(Ordering::SeqCst) {
            MonitorState::Stopped
        } else {
            MonitorState::Watching
        }
    }

    /// Stop watching and release the watch, the worker thread and the path
    /// claim. Idempotent. Once this returns no further events are delivered,
    /// except when called from inside the event callback, where the worker
    /// exits after the callback returns.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let control = self.control.lock().take();
        let Some(control) = control else {
            return;
        };

        let Control {
            watcher,
            tx,
            worker,
            _claim,
        } = control;
        // Unregisters the watch and ends the backend's own thread.
        drop(watcher);
        let _ = tx.send(Signal::Stop);

        if worker.thread().id() != thread::current().id() && worker.join().is_err() {
            warn!(path = %self.path.display(), "monitor worker panicked");
        }
        info!(path = %self.path.display(), "monitoring stopped");
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── worker ──────────────────────────────────────────────────────────────────

struct Worker<F> {
    path: PathBuf,
    algorithm: HashAlgorithm,
    last_digest: Digest,
    stop_on_missing: bool,
    stopped: Arc<AtomicBool>,
    control: ControlSlot,
    on_event: F,
}

impl<F> Worker<F>
where
    F: FnMut(MonitorEvent),
{
    fn run(mut self, rx: mpsc::Receiver<Signal>) {
        while let Ok(signal) = rx.recv() {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            let event = match signal {
                Signal::Stop => break,
                Signal::Fs(Err(e)) => {
                    warn!(path = %self.path.display(), error = %e, "file watcher error");
                    continue;
                }
                Signal::Fs(Ok(event)) => event,
            };

            if !watcher::is_content_event(&event.kind) || !watcher::concerns_target(&event, &self.path) {
                trace!(kind = ?event.kind, paths = ?event.paths, "ignored notification");
                continue;
            }

            let report = self.recompute();
            let ends_session = self.stop_on_missing
                && matches!(
                    report,
                    MonitorEvent::Error {
                        kind: DigestErrorKind::NotFound,
                        ..
                    }
                );

            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            (self.on_event)(report);

            if ends_session {
                info!(path = %self.path.display(), "watched file is gone, ending session");
                // Drops the watch and the path claim; our own join handle is
                // detached rather than joined.
                let control = self.control.lock().take();
                drop(control);
                self.stopped.store(true, Ordering::SeqCst);
                break;
            }
        }
        debug!(path = %self.path.display(), "monitor worker exiting");
    }

    fn recompute(&mut self) -> MonitorEvent {
        match compute_digest(&self.path, self.algorithm) {
            Ok(current) if current != self.last_digest => {
                info!(
                    path = %self.path.display(),
                    previous = %self.last_digest,
                    current = %current,
                    "file has been modified"
                );
                let previous = std::mem::replace(&mut self.last_digest, current.clone());
                MonitorEvent::Changed {
                    path: self.path.clone(),
                    previous,
                    current,
                }
            }
            Ok(digest) => {
                debug!(path = %self.path.display(), "file has not changed");
                MonitorEvent::Unchanged {
                    path: self.path.clone(),
                    digest,
                }
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "recompute failed");
                MonitorEvent::Error {
                    path: self.path.clone(),
                    kind: e.kind(),
                    detail: e.to_string(),
                }
            }
        }
    }
}
