//! Coordinator / Daemon API (spec §4.9): the one stateful object wrapping
//! an atomically-swappable `ProjectIndex`, serializing rebuilds behind a
//! build lock and enforcing per-operation deadlines.

use crate::candidates::{self, Relevance};
use crate::config::Settings;
use crate::diff::{self, Hunk};
use crate::error::{CoreError, CoreResult};
use crate::index::{BuildOptions, ProjectIndex, ResolveOutcome};
use crate::pack::{self, ContextPack, PackOptions, TokenEstimator};
use crate::types::SymbolId;
use arc_swap::ArcSwapOption;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Status {
    pub indexed: bool,
    pub symbol_count: usize,
    pub file_count: usize,
    pub last_invalidated_unix: i64,
    pub rebuild_in_flight: bool,
}

/// Holds the live index behind an atomic swap so a request reading it never
/// blocks a concurrent rebuild (spec §4.9). The build lock below serializes
/// rebuild *starts*; it does not gate readers.
pub struct Coordinator {
    workspace: PathBuf,
    settings: Settings,
    index: ArcSwapOption<ProjectIndex>,
    estimator: Box<dyn TokenEstimator>,
    build_lock: AsyncMutex<()>,
    rebuild_in_flight: AtomicBool,
    last_invalidated_unix: AtomicI64,
}

impl Coordinator {
    pub fn new(workspace: impl Into<PathBuf>, settings: Settings) -> Self {
        let estimator = pack::resolve_estimator(&settings.pack.tokenizer);
        Self {
            workspace: workspace.into(),
            settings,
            index: ArcSwapOption::empty(),
            estimator,
            build_lock: AsyncMutex::new(()),
            rebuild_in_flight: AtomicBool::new(false),
            last_invalidated_unix: AtomicI64::new(0),
        }
    }

    /// `BuildIndex` (spec §6): rebuilds from the workspace snapshot,
    /// enforced under `daemon.index_timeout_secs`.
    pub async fn build_index(&self) -> CoreResult<String> {
        let _build_guard = self.build_lock.lock().await;
        self.rebuild_in_flight.store(true, Ordering::SeqCst);

        let workspace = self.workspace.clone();
        let settings = self.settings.clone();
        let mut options = BuildOptions::default();
        options.include_sources = true;
        options.include_ranges = true;
        options.include_reverse_adjacency = settings.indexing.include_reverse_adjacency;

        let timeout = Duration::from_secs(self.settings.daemon.index_timeout_secs);
        let result = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || ProjectIndex::build(&workspace, &settings, options)),
        )
        .await;

        self.rebuild_in_flight.store(false, Ordering::SeqCst);

        let new_index = match result {
            Err(_) => return Err(CoreError::Timeout { operation: "BuildIndex".to_string(), deadline_ms: timeout.as_millis() as u64 }),
            Ok(Err(join_err)) => return Err(CoreError::InternalError(format!("index build task panicked: {join_err}"))),
            Ok(Ok(index)) => index,
        };

        let fingerprint = project_index_fingerprint(&new_index);
        info!(symbols = new_index.symbols.len(), files = new_index.file_count, "index built");
        self.index.store(Some(Arc::new(new_index)));
        Ok(fingerprint)
    }

    /// `ResolveEntry` (spec §6).
    pub fn resolve_entry(&self, entry: &str) -> CoreResult<SymbolId> {
        let guard = self.index.load();
        let index = guard.as_ref().ok_or_else(|| CoreError::IndexUnavailable { reason: "no index built yet".to_string() })?;
        match index.resolve_entry(entry) {
            ResolveOutcome::Resolved(id) => Ok(id),
            ResolveOutcome::Ambiguous(candidates) => {
                Err(CoreError::AmbiguousEntry { entry: entry.to_string(), candidates })
            }
            ResolveOutcome::Unknown => Err(CoreError::UnknownEntry { entry: entry.to_string() }),
        }
    }

    /// `Pack` (spec §6): `seed` symbols expand to candidates via the
    /// Candidate Builder, then the Context Pack Engine assembles the result.
    pub async fn pack(
        &self,
        seed: Vec<SymbolId>,
        depth: u8,
        budget: u32,
        options: PackOptions,
        cancel: CancellationToken,
    ) -> CoreResult<ContextPack> {
        let guard = self.index.load();
        let index = guard.as_ref().ok_or_else(|| CoreError::IndexUnavailable { reason: "no index built yet".to_string() })?.clone();

        for id in &seed {
            if index.symbol(id).is_none() {
                return Err(CoreError::UnknownEntry { entry: id.as_str().to_string() });
            }
        }
        let seeded: Vec<(SymbolId, Relevance)> = seed.into_iter().map(|id| (id, Relevance::EntryPoint)).collect();
        let cap = candidates::default_cap(budget, 20);

        let timeout = Duration::from_secs(self.settings.daemon.pack_timeout_secs);
        let workspace = self.workspace.clone();
        let estimator_name = self.settings.pack.tokenizer.clone();

        run_with_deadline(timeout, "Pack", cancel, move || {
            let candidates = candidates::build_candidates(&index, seeded, depth, &Default::default(), Some(cap));
            let estimator = pack::resolve_estimator(&estimator_name);
            pack::pack(&workspace, &index, &candidates, budget, &options, estimator.as_ref())
        })
        .await
    }

    /// `DiffPack` (spec §6): hunks map to symbols first, seeding
    /// `ContainsDiff` candidates before the same packing path as `Pack`.
    pub async fn diff_pack(&self, hunks: Vec<Hunk>, depth: u8, budget: u32, options: PackOptions, cancel: CancellationToken) -> CoreResult<ContextPack> {
        let guard = self.index.load();
        let index = guard.as_ref().ok_or_else(|| CoreError::IndexUnavailable { reason: "no index built yet".to_string() })?.clone();

        let mapped = diff::map_hunks(&index, &hunks);
        let diff_lines: std::collections::HashMap<SymbolId, Vec<(u32, u32)>> = mapped.mapping.iter().cloned().collect();
        let seeded: Vec<(SymbolId, Relevance)> = mapped.mapping.into_iter().map(|(id, _)| (id, Relevance::ContainsDiff)).collect();
        let cap = candidates::default_cap(budget, 20);

        let timeout = Duration::from_secs(self.settings.daemon.pack_timeout_secs);
        let workspace = self.workspace.clone();
        let estimator_name = self.settings.pack.tokenizer.clone();

        run_with_deadline(timeout, "DiffPack", cancel, move || {
            let candidates = candidates::build_candidates(&index, seeded, depth, &diff_lines, Some(cap));
            let estimator = pack::resolve_estimator(&estimator_name);
            pack::pack(&workspace, &index, &candidates, budget, &options, estimator.as_ref())
        })
        .await
    }

    /// `Status` (spec §6, expanded per SPEC_FULL.md §4.9).
    pub fn status(&self) -> Status {
        let guard = self.index.load();
        Status {
            indexed: guard.is_some(),
            symbol_count: guard.as_ref().map(|i| i.symbols.len()).unwrap_or(0),
            file_count: guard.as_ref().map(|i| i.file_count).unwrap_or(0),
            last_invalidated_unix: self.last_invalidated_unix.load(Ordering::SeqCst),
            rebuild_in_flight: self.rebuild_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Marks the index stale (spec §5 "Invalidation"); called by the file
    /// watcher. The next request triggering a rebuild will observe this.
    pub fn mark_invalidated(&self, unix_time: i64) {
        self.last_invalidated_unix.store(unix_time, Ordering::SeqCst);
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// A snapshot guard over the current index, for callers (e.g. the CLI)
    /// that need read access without going through a request method.
    pub fn index_snapshot(&self) -> arc_swap::Guard<Option<Arc<ProjectIndex>>> {
        self.index.load()
    }
}

async fn run_with_deadline<F>(timeout: Duration, operation: &str, cancel: CancellationToken, work: F) -> CoreResult<ContextPack>
where
    F: FnOnce() -> ContextPack + Send + 'static,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        result = tokio::time::timeout(timeout, tokio::task::spawn_blocking(work)) => {
            match result {
                Err(_) => Err(CoreError::Timeout { operation: operation.to_string(), deadline_ms: timeout.as_millis() as u64 }),
                Ok(Err(join_err)) => {
                    warn!(%join_err, operation, "pack task panicked");
                    Err(CoreError::InternalError(format!("{operation} task panicked: {join_err}")))
                }
                Ok(Ok(pack)) => Ok(pack),
            }
        }
    }
}

fn project_index_fingerprint(index: &ProjectIndex) -> String {
    use sha2::{Digest, Sha256};
    let mut ids: Vec<&str> = index.symbols.keys().map(|id| id.as_str()).collect();
    ids.sort();
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update(b";");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn build_then_resolve_roundtrip() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let coordinator = Coordinator::new(dir.path(), Settings::default());
        coordinator.build_index().await.unwrap();
        let id = coordinator.resolve_entry("foo").unwrap();
        assert_eq!(id.as_str(), "a.py:foo");
    }

    #[tokio::test]
    async fn pack_without_index_returns_index_unavailable() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(dir.path(), Settings::default());
        let result = coordinator
            .pack(vec![SymbolId::new("a.py", "foo")], 1, 100, PackOptions::default(), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CoreError::IndexUnavailable { .. })));
    }

    /// Boundary behavior (spec §8): a seed symbol absent from the index
    /// surfaces `UnknownEntry` rather than silently dropping out of the
    /// candidate set.
    #[tokio::test]
    async fn pack_with_unknown_seed_returns_unknown_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let coordinator = Coordinator::new(dir.path(), Settings::default());
        coordinator.build_index().await.unwrap();

        let result = coordinator
            .pack(vec![SymbolId::new("a.py", "does_not_exist")], 1, 100, PackOptions::default(), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CoreError::UnknownEntry { .. })));
    }
}
