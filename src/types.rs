//! Core identifiers and enums shared across every component.
//!
//! `SymbolId` is the one identifier that crosses every component boundary in
//! this crate: the extractor mints it, the index keys on it, the candidate
//! builder and packer carry it, and every serializer prints it. Keeping it a
//! single interned string (rather than a numeric handle local to one index
//! build) is what lets a delta session refer to symbols across rebuilds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// `«relative_path»:«qualified_name»`, e.g. `src/pack/mod.rs:Packer::pack`.
///
/// Interned as an `Arc<str>` so clones are cheap: a candidate, a slice and a
/// session-store entry can all hold their own copy without re-allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(Arc<str>);

impl SymbolId {
    pub fn new(relative_path: &str, qualified_name: &str) -> Self {
        Self(Arc::from(format!("{relative_path}:{qualified_name}")))
    }

    /// Build directly from an already-formatted `path:name` string (used when
    /// round-tripping a serialized pack).
    pub fn from_raw(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits back into `(relative_path, qualified_name)`. Qualified names
    /// never contain a `:`, so the *first* colon is the split point; file
    /// paths on Windows-style inputs are normalized to `/` by the extractor
    /// before a SymbolId is ever minted, so this is unambiguous.
    pub fn split(&self) -> (&str, &str) {
        self.0
            .split_once(':')
            .unwrap_or((self.0.as_ref(), ""))
    }

    pub fn file(&self) -> &str {
        self.split().0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SymbolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An internal, per-build handle into `ProjectIndex::file_index`/`imports`.
/// Never crosses a component boundary — SymbolId is the public identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Unknown,
}

impl Language {
    /// Dispatches by extension. Unknown extensions map to `Unknown`, never
    /// an error — per spec.md §4.1 an unsupported file is simply empty.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py" | "pyi") => Language::Python,
            Some("ts" | "tsx" | "mts" | "cts") => Language::TypeScript,
            Some("js" | "jsx" | "mjs" | "cjs") => Language::JavaScript,
            Some("rs") => Language::Rust,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c" | "h") => Language::C,
            Some("cc" | "cpp" | "cxx" | "hpp" | "hh") => Language::Cpp,
            Some("rb") => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Module,
}

/// A 1-based, inclusive line range. `start <= end` is enforced by every
/// extractor before a `Symbol` is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "line range start must not exceed end");
        Self { start, end }
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    /// Intersection of `self` with `[start, end]`, clipped to `self`'s bounds.
    pub fn clip(&self, start: u32, end: u32) -> Option<(u32, u32)> {
        let s = self.start.max(start);
        let e = self.end.min(end);
        (s <= e).then_some((s, e))
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
