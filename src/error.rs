//! Closed error enumeration for the context packing pipeline.
//!
//! Every fallible operation in the core returns `CoreError`. The set of
//! variants is closed by design (see `spec §7` equivalent in `SPEC_FULL.md`):
//! callers match exhaustively rather than inspecting error strings.

use crate::types::SymbolId;
use std::path::PathBuf;
use thiserror::Error;

/// The core's single error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Index not yet built, or currently rebuilding.
    #[error("project index is unavailable: {reason}")]
    IndexUnavailable { reason: String },

    /// Per-file parse failure. Swallowed inside index build; logged, never fatal.
    #[error("failed to extract symbols from '{path}': {cause}")]
    ExtractFailed { path: PathBuf, cause: String },

    /// Entry string resolves to more than one symbol.
    #[error("'{entry}' is ambiguous: {} candidates", candidates.len())]
    AmbiguousEntry {
        entry: String,
        candidates: Vec<SymbolId>,
    },

    /// Entry string matches nothing in the index.
    #[error("'{entry}' does not match any indexed symbol")]
    UnknownEntry { entry: String },

    /// Every candidate degraded to signature-only; still no code fits.
    /// Surfaced as a successful, empty-bodied pack — never a hard failure.
    #[error("budget {budget} exhausted before any body could be included")]
    BudgetExhausted { budget: u32 },

    /// Delta store read/write failed. The pack is still returned, without
    /// `unchanged` populated.
    #[error("session '{session_id}' I/O failed: {cause}")]
    SessionIOError { session_id: String, cause: String },

    /// Caller cancellation. No partial state is written.
    #[error("request was cancelled")]
    Cancelled,

    /// Per-operation soft deadline exceeded; partial work discarded.
    #[error("operation '{operation}' exceeded its {deadline_ms}ms deadline")]
    Timeout { operation: String, deadline_ms: u64 },

    /// Logic bug or invariant violation. Always fatal for the request.
    #[error("internal invariant violated: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Short, user-facing recovery hints. Empty when no specific advice applies.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexUnavailable { .. } => vec![
                "run a BuildIndex request before packing",
                "if a rebuild is already in flight, retry shortly",
            ],
            Self::AmbiguousEntry { .. } => vec![
                "re-issue ResolveEntry with a path-qualified form ('path:name')",
            ],
            Self::UnknownEntry { .. } => vec![
                "check the entry spelling, or confirm the file was indexed",
            ],
            Self::BudgetExhausted { .. } => {
                vec!["raise the budget, or request a smaller seed/depth"]
            }
            Self::SessionIOError { .. } => {
                vec!["delta tracking degraded to non-delta for this request only"]
            }
            Self::Timeout { .. } => vec!["retry with a smaller depth or budget"],
            _ => vec![],
        }
    }

    /// Whether this kind is expected to show up during normal operation
    /// (as opposed to `InternalError`, which always indicates a bug).
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalError(_))
    }
}

/// Result type alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Adds file-path or free-text context to a foreign error, converting it
/// into an `InternalError`. Used at component boundaries where a foreign
/// error (`io::Error`, `serde_json::Error`, ...) must become a `CoreError`
/// without a closer-fitting variant.
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> CoreResult<T>;
    fn with_path(self, path: &std::path::Path) -> CoreResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> CoreResult<T> {
        self.map_err(|e| CoreError::InternalError(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> CoreResult<T> {
        self.map_err(|e| CoreError::InternalError(format!("'{}': {e}", path.display())))
    }
}
