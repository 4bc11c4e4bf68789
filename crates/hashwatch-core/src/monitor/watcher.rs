//! Notification backend for the change monitor.
//!
//! Wraps a `notify` watcher whose callback forwards raw events into the
//! worker's channel, and decides which raw events concern the target file.

use super::MonitorConfig;
use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, Watcher};
use std::path::Path;
use std::sync::mpsc;
use tracing::{debug, warn};

/// Messages the monitor worker waits on.
pub(crate) enum Signal {
    Fs(notify::Result<Event>),
    Stop,
}

/// Build the OS-native watcher, or a polling watcher when polling is
/// requested or the native backend cannot be created.
pub(crate) fn build_watcher(
    tx: mpsc::Sender<Signal>,
    config: &MonitorConfig,
) -> notify::Result<Box<dyn Watcher + Send>> {
    let notify_config = Config::default().with_poll_interval(config.poll_interval());

    if !config.use_polling {
        let native_tx = tx.clone();
        match RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = native_tx.send(Signal::Fs(res));
            },
            notify_config,
        ) {
            Ok(watcher) => return Ok(Box::new(watcher)),
            Err(e) => {
                warn!(error = %e, "native file notifications unavailable, falling back to polling");
            }
        }
    }

    // mtimes are compared in whole seconds, so a rewrite within the same
    // second is only seen by comparing contents.
    let watcher = PollWatcher::new(
        move |res: notify::Result<Event>| {
            let _ = tx.send(Signal::Fs(res));
        },
        notify_config.with_compare_contents(true),
    )?;
    debug!(interval_ms = config.poll_interval_ms, "using polling watcher");
    Ok(Box::new(watcher))
}

/// Event kinds that can mean the file's bytes changed. A completed write
/// (`Close(Write)`) is included so the final state after a burst of writes
/// is always hashed.
pub(crate) fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

/// True when one of the event's paths is the target. `target` is canonical;
/// event paths are compared directly, then by name within the same
/// canonical directory.
pub(crate) fn concerns_target(event: &Event, target: &Path) -> bool {
    event.paths.iter().any(|p| {
        if p == target {
            return true;
        }
        if p.file_name() != target.file_name() {
            return false;
        }
        match (p.parent().and_then(|d| d.canonicalize().ok()), target.parent()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    })
}
