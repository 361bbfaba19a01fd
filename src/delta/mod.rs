//! Delta State Store (spec §4.7): per-session record of symbol fingerprints
//! previously delivered, used to elide unchanged bodies on later turns.

use crate::config::Settings;
use crate::types::SymbolId;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::warn;

/// 1% GC sweep probability (spec §4.7: "probabilistically, e.g. 1% of calls").
const GC_SAMPLE_RATE: f64 = 0.01;

fn session_expiry() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub entries: HashMap<SymbolId, String>,
}

impl SessionState {
    fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self { session_id: session_id.to_string(), created_at: now, last_used_at: now, entries: HashMap::new() }
    }
}

pub struct ReconcileOutcome {
    pub unchanged: Vec<SymbolId>,
    pub updated_state: SessionState,
}

static SESSION_LOCKS: LazyLock<DashMap<String, Arc<Mutex<()>>>> = LazyLock::new(DashMap::new);

fn session_lock(session_id: &str) -> Arc<Mutex<()>> {
    let entry = SESSION_LOCKS.entry(session_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(())));
    entry.value().clone()
}

fn sessions_dir(workspace: &Path) -> PathBuf {
    Settings::tldrs_dir(workspace).join("sessions")
}

fn session_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{session_id}.json"))
}

/// `reconcile()` per spec §4.7. `slices` is `(SymbolId, etag)` for every
/// slice the packer produced this call, in any order. Concurrent calls for
/// the same `session_id` are serialized by a per-session lock.
pub fn reconcile(workspace: &Path, session_id: &str, slices: &[(SymbolId, String)]) -> ReconcileOutcome {
    let lock = session_lock(session_id);
    let _guard = lock.lock();

    let dir = sessions_dir(workspace);
    let path = session_path(&dir, session_id);
    let mut state = load_state(&path, session_id);

    let mut unchanged = Vec::new();
    for (id, etag) in slices {
        match state.entries.get(id) {
            Some(prev) if prev == etag => unchanged.push(id.clone()),
            _ => {
                state.entries.insert(id.clone(), etag.clone());
            }
        }
    }
    state.last_used_at = Utc::now();

    if let Err(cause) = write_state(&dir, &path, &state) {
        warn!(session_id, %cause, "failed to persist session state; delta tracking degraded for this request");
    }

    if rand::random::<f64>() < GC_SAMPLE_RATE {
        gc(&dir);
    }

    ReconcileOutcome { unchanged, updated_state: state }
}

/// Any I/O or parse error is treated as "no prior state" (spec §4.7
/// failure semantics), not surfaced — the pack proceeds as a first turn.
fn load_state(path: &Path, session_id: &str) -> SessionState {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|_| SessionState::new(session_id)),
        Err(_) => SessionState::new(session_id),
    }
}

fn write_state(dir: &Path, path: &Path, state: &SessionState) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(state).map_err(std::io::Error::other)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}

/// Removes session files whose `last_used_at` is older than 24 hours.
fn gc(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    let cutoff = Utc::now() - session_expiry();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else { continue };
        let Ok(state) = serde_json::from_str::<SessionState>(&text) else { continue };
        if state.last_used_at < cutoff {
            let _ = std::fs::remove_file(&path);
        }
    }
}
