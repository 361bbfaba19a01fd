//! File watcher (SPEC_FULL.md §2 "ambient stack"): marks the Coordinator's
//! index stale on filesystem change. Debounced; the rebuild itself happens
//! lazily on the next request, not from inside the watcher callback.

use crate::coordinator::Coordinator;
use notify::{Event, RecursiveMode, Watcher};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub struct FileWatcher {
    _watcher: Box<dyn Watcher + Send>,
}

/// Starts a debounced watcher over `coordinator.workspace()`. Each distinct
/// burst of filesystem events (collapsed over `debounce`) calls
/// `coordinator.mark_invalidated(now)` once.
pub fn spawn(coordinator: Arc<Coordinator>, debounce: Duration) -> notify::Result<FileWatcher> {
    let (tx, rx) = channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    watcher.watch(coordinator.workspace(), RecursiveMode::Recursive)?;

    std::thread::spawn(move || loop {
        match rx.recv_timeout(debounce) {
            Ok(Ok(_event)) => {
                // Drain any further events that arrive within the debounce
                // window so a burst (e.g. a branch checkout) invalidates once.
                while rx.recv_timeout(debounce).is_ok() {}
                let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
                debug!(now, "workspace change detected, marking index stale");
                coordinator.mark_invalidated(now);
            }
            Ok(Err(cause)) => warn!(%cause, "watch error"),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    });

    Ok(FileWatcher { _watcher: Box::new(watcher) })
}
