//! Context Pack Engine (spec §4.5): assembles ordered candidates into a
//! token-budgeted bundle, degrading whole-or-nothing per slice, computing
//! stable fingerprints for cross-turn delta tracking.

pub mod thresholds;
pub mod tokens;
pub mod zoom;

pub use tokens::{resolve as resolve_estimator, TokenEstimator};
pub use zoom::Zoom;

use crate::candidates::Candidate;
use crate::compress::{self, CompressHints};
use crate::delta;
use crate::index::ProjectIndex;
use crate::types::{Language, SymbolId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compress {
    None,
    Blocks,
    TwoStage,
    ChunkSummary,
}

#[derive(Debug, Clone)]
pub struct PackOptions {
    pub zoom: Zoom,
    pub compress: Compress,
    pub strip_comments: bool,
    pub compress_imports: bool,
    pub session_id: Option<String>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            zoom: Zoom::Windowed,
            compress: Compress::Blocks,
            strip_comments: false,
            compress_imports: false,
            session_id: None,
        }
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

fn is_empty_lines(v: &[(u32, u32)]) -> bool {
    v.is_empty()
}

/// Non-default meta fields only (spec §4.5 "Meta sparsity invariant").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SliceMeta {
    #[serde(skip_serializing_if = "is_zero", default)]
    pub block_count: u32,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub dropped_blocks: u32,
    #[serde(skip_serializing_if = "is_empty_lines", default)]
    pub diff_lines: Vec<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,
}

impl SliceMeta {
    fn is_default(&self) -> bool {
        self.block_count == 0 && self.dropped_blocks == 0 && self.diff_lines.is_empty() && self.summary.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSlice {
    pub id: SymbolId,
    pub signature: String,
    pub lines: (u32, u32),
    pub relevance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub etag: String,
    #[serde(skip_serializing_if = "SliceMeta::is_default", default)]
    pub meta: SliceMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPack {
    pub slices: Vec<ContextSlice>,
    pub budget: u32,
    pub budget_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchanged: Option<Vec<SymbolId>>,
    pub cache_stats: CacheStats,
    pub project_fingerprint: String,
}

/// `pack()` per spec §4.5. `workspace` locates the delta session store when
/// `options.session_id` is set; ignored otherwise.
pub fn pack(
    workspace: &Path,
    index: &ProjectIndex,
    candidates: &[Candidate],
    budget: u32,
    options: &PackOptions,
    estimator: &dyn TokenEstimator,
) -> ContextPack {
    let mut slices: Vec<ContextSlice> = Vec::new();
    let mut remaining = budget as i64;

    for candidate in candidates {
        let Some(symbol) = index.symbol(&candidate.symbol_id) else { continue };

        let signature = index
            .signature_overrides
            .get(&candidate.symbol_id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| symbol.signature.to_string());

        let full_body = index
            .source_cache
            .as_ref()
            .and_then(|cache| cache.get(symbol.file.as_ref()))
            .map(|source| extract_body(source, symbol.line_start(), symbol.line_end()));

        let mut code = zoom::shape(options.zoom, symbol, full_body.as_deref(), &candidate.diff_lines);
        let mut meta = SliceMeta { diff_lines: candidate.diff_lines.clone(), ..Default::default() };

        if options.strip_comments {
            code = code.map(|c| zoom::strip_comments(&c));
        }
        if options.compress_imports {
            code = code.map(|c| collapse_imports(&c));
        }

        if let Some(body) = code.as_deref() {
            let body_tokens = estimator.estimate(body) as usize;
            if let Some(ceiling) = thresholds::soft_ceiling(options.compress) {
                if body_tokens > ceiling {
                    let local_budget = ceiling.min(remaining.max(0) as usize);
                    // The Block Compressor numbers blocks 1-based from the
                    // start of `body`, but `candidate.diff_lines` are
                    // absolute file line numbers — rebase them onto the
                    // body's own numbering before scoring, or diff-line
                    // matches silently miss for every symbol that doesn't
                    // start at line 1 of its file.
                    let body_start = symbol.line_start();
                    let local_diff_lines: Vec<(u32, u32)> = candidate
                        .diff_lines
                        .iter()
                        .map(|(s, e)| (s.saturating_sub(body_start) + 1, e.saturating_sub(body_start) + 1))
                        .collect();
                    let outcome = apply_compression(
                        options.compress,
                        body,
                        symbol.language,
                        local_budget,
                        &local_diff_lines,
                        forward_call_names(index, &candidate.symbol_id),
                        estimator,
                    );
                    code = outcome.code;
                    meta.block_count = outcome.kept_blocks;
                    meta.dropped_blocks = outcome.dropped_blocks;
                    meta.summary = outcome.summary;
                }
            }
        }

        let sig_tokens = estimator.estimate(&signature) as i64;
        if sig_tokens > remaining {
            continue;
        }

        let code_tokens = code.as_deref().map(|c| estimator.estimate(c) as i64).unwrap_or(0);
        let (final_code, used) = if sig_tokens + code_tokens <= remaining {
            (code, sig_tokens + code_tokens)
        } else {
            (None, sig_tokens)
        };
        if final_code.is_none() && meta.summary.is_none() {
            // A compression pass that already produced a summary (ChunkSummary
            // mode, which elides `code` by design) keeps its `meta` as-is;
            // only the plain degrade-to-signature path resets it to bare
            // `diff_lines`, since in that case no compression pass ran against
            // a body that ended up excluded anyway.
            meta = SliceMeta { diff_lines: candidate.diff_lines.clone(), ..Default::default() };
        }

        remaining -= used;
        let etag = fingerprint(&signature, final_code.as_deref());

        slices.push(ContextSlice {
            id: candidate.symbol_id.clone(),
            signature,
            lines: (symbol.line_start(), symbol.line_end()),
            relevance: candidate.relevance.short_tag(),
            code: final_code,
            etag,
            meta,
        });
    }

    let unchanged = options.session_id.as_deref().map(|session_id| {
        let entries: Vec<(SymbolId, String)> = slices.iter().map(|s| (s.id.clone(), s.etag.clone())).collect();
        let outcome = delta::reconcile(workspace, session_id, &entries);
        for id in &outcome.unchanged {
            if let Some(slice) = slices.iter_mut().find(|s| &s.id == id) {
                slice.code = None;
            }
        }
        outcome.unchanged
    });

    let hits = unchanged.as_ref().map(|u| u.len() as u32).unwrap_or(0);
    let misses = slices.len() as u32 - hits;
    let hit_rate = if slices.is_empty() { 0.0 } else { hits as f64 / slices.len() as f64 };

    let project_fingerprint = project_fingerprint(&slices);
    let budget_used = (budget as i64 - remaining).max(0) as u32;

    ContextPack {
        slices,
        budget,
        budget_used,
        unchanged,
        cache_stats: CacheStats { hits, misses, hit_rate },
        project_fingerprint,
    }
}

fn extract_body(source: &str, line_start: u32, line_end: u32) -> String {
    let start = line_start.saturating_sub(1) as usize;
    let end = line_end as usize;
    source.lines().skip(start).take(end.saturating_sub(start)).collect::<Vec<_>>().join("\n")
}

fn forward_call_names(index: &ProjectIndex, id: &SymbolId) -> Vec<String> {
    index
        .forward_calls
        .get(id)
        .map(|callees| {
            callees
                .iter()
                .filter_map(|c| index.symbol(c))
                .map(|s| s.name.to_string())
                .collect()
        })
        .unwrap_or_default()
}

struct CompressionOutcome {
    code: Option<String>,
    kept_blocks: u32,
    dropped_blocks: u32,
    summary: Option<String>,
}

fn apply_compression(
    compress: Compress,
    code: &str,
    language: Language,
    local_budget: usize,
    diff_lines: &[(u32, u32)],
    call_edge_identifiers: Vec<String>,
    estimator: &dyn TokenEstimator,
) -> CompressionOutcome {
    let hints = CompressHints { diff_lines, call_edge_identifiers: &call_edge_identifiers };
    let estimate = |text: &str| estimator.estimate(text);

    match compress {
        Compress::None => CompressionOutcome { code: Some(code.to_string()), kept_blocks: 0, dropped_blocks: 0, summary: None },
        Compress::Blocks => {
            let outcome = compress::compress_body(code, language, local_budget, &hints, estimate);
            CompressionOutcome { code: Some(outcome.code), kept_blocks: outcome.kept_blocks, dropped_blocks: outcome.dropped_blocks, summary: None }
        }
        Compress::TwoStage => {
            let sketch = zoom::shape(Zoom::Sketch, &dummy_symbol_for_sketch(), Some(code), diff_lines).unwrap_or_default();
            if estimate(&sketch) as usize <= local_budget {
                CompressionOutcome { code: Some(sketch), kept_blocks: 0, dropped_blocks: 0, summary: None }
            } else {
                let outcome = compress::compress_body(&sketch, language, local_budget, &hints, estimate);
                CompressionOutcome { code: Some(outcome.code), kept_blocks: outcome.kept_blocks, dropped_blocks: outcome.dropped_blocks, summary: None }
            }
        }
        Compress::ChunkSummary => {
            let lines = code.lines().count();
            let blocks = code.split("\n\n").filter(|b| !b.trim().is_empty()).count();
            CompressionOutcome {
                code: None,
                kept_blocks: 0,
                dropped_blocks: blocks as u32,
                summary: Some(format!("{lines} lines, {blocks} blocks elided")),
            }
        }
    }
}

/// `zoom::shape`'s `Sketch` variant only needs `full_body`; the symbol
/// itself is unused for that branch, so a minimal stand-in avoids
/// threading the real `Symbol` through the compression path.
fn dummy_symbol_for_sketch() -> crate::symbol::Symbol {
    crate::symbol::Symbol::new(
        "",
        "",
        "",
        crate::types::LineRange::new(1, 1),
        Language::Unknown,
        crate::types::SymbolKind::Function,
        "",
        None,
    )
}

const IMPORT_PREFIXES: &[&str] = &["import ", "from ", "use ", "require(", "#include", "include "];

/// Collapses a run of import-like lines into a single count line, keeping
/// the first. Non-import lines pass through unchanged.
fn collapse_imports(code: &str) -> String {
    let mut out = Vec::new();
    let mut run = 0u32;
    for line in code.lines() {
        let trimmed = line.trim_start();
        let is_import = IMPORT_PREFIXES.iter().any(|p| trimmed.starts_with(p));
        if is_import {
            run += 1;
            if run == 1 {
                out.push(line.to_string());
            }
        } else {
            if run > 1 {
                out.push(format!("# ... ({} more imports)", run - 1));
            }
            run = 0;
            out.push(line.to_string());
        }
    }
    if run > 1 {
        out.push(format!("# ... ({} more imports)", run - 1));
    }
    out.join("\n")
}

/// 16-hex prefix of `SHA-256(signature ++ "\n" ++ code_or_empty)`.
pub fn fingerprint(signature: &str, code: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    hasher.update(b"\n");
    hasher.update(code.unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 8)
}

/// `SHA-256` of the concatenation of sorted `(SymbolId, etag)` pairs.
pub fn project_fingerprint(slices: &[ContextSlice]) -> String {
    let mut pairs: Vec<(&str, &str)> = slices.iter().map(|s| (s.id.as_str(), s.etag.as_str())).collect();
    pairs.sort();
    let mut hasher = Sha256::new();
    for (id, etag) in pairs {
        hasher.update(id.as_bytes());
        hasher.update(b":");
        hasher.update(etag.as_bytes());
        hasher.update(b";");
    }
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// `SHA-256` of the concatenation of sorted `(SymbolId, signature)` pairs —
/// the `short_project_fingerprint` the cache-friendly header prints (spec
/// §4.8 layout item 1). Deliberately distinct from `project_fingerprint`:
/// that one folds in etags, which fold in code, so printing it in the
/// header would make the header (and therefore the prefix) depend on body
/// content and violate the prefix-stability invariant (spec §4.8, §8).
/// This one only ever changes when a symbol's signature or membership does.
pub fn signature_fingerprint(slices: &[ContextSlice]) -> String {
    let mut pairs: Vec<(&str, &str)> = slices.iter().map(|s| (s.id.as_str(), s.signature.as_str())).collect();
    pairs.sort();
    let mut hasher = Sha256::new();
    for (id, signature) in pairs {
        hasher.update(id.as_bytes());
        hasher.update(b":");
        hasher.update(signature.as_bytes());
        hasher.update(b";");
    }
    let digest = hasher.finalize();
    format!("{digest:x}")
}

fn hex_prefix(digest: &[u8], byte_len: usize) -> String {
    digest.iter().take(byte_len).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::Relevance;
    use crate::config::Settings;
    use crate::index::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn build_fixture() -> (TempDir, ProjectIndex) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    x = 1\n    return x\n").unwrap();
        let mut options = BuildOptions::default();
        options.include_sources = true;
        let index = ProjectIndex::build(dir.path(), &Settings::default(), options);
        (dir, index)
    }

    #[test]
    fn budget_zero_yields_no_slices() {
        let (dir, index) = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = vec![Candidate { symbol_id: foo, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let result = pack(dir.path(), &index, &candidates, 0, &PackOptions::default(), &estimator);
        assert!(result.slices.is_empty());
        assert_eq!(result.budget_used, 0);
    }

    #[test]
    fn ample_budget_includes_full_code() {
        let (dir, index) = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = vec![Candidate { symbol_id: foo, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        let result = pack(dir.path(), &index, &candidates, 1000, &opts, &estimator);
        assert_eq!(result.slices.len(), 1);
        assert!(result.slices[0].code.is_some());
        assert!(result.budget_used <= result.budget);
    }

    #[test]
    fn tight_budget_degrades_to_signature_only() {
        let (dir, index) = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = vec![Candidate { symbol_id: foo, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        let sig_tokens = estimator.estimate("def foo():") as u32;
        let result = pack(dir.path(), &index, &candidates, sig_tokens, &opts, &estimator);
        assert_eq!(result.slices.len(), 1);
        assert!(result.slices[0].code.is_none());
    }

    #[test]
    fn meta_is_absent_for_plain_slice() {
        let (dir, index) = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = vec![Candidate { symbol_id: foo, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        opts.compress = Compress::None;
        let result = pack(dir.path(), &index, &candidates, 1000, &opts, &estimator);
        assert!(result.slices[0].meta.is_default());
    }

    /// `ChunkSummary` elides the body by design; its generated summary must
    /// survive the budget-degrade path (regression: the degrade branch used
    /// to unconditionally reset `meta`, discarding the summary it had just
    /// computed, so every `ChunkSummary` slice came out indistinguishable
    /// from a plain signature-only degrade).
    #[test]
    fn chunk_summary_survives_degrade_to_signature_only() {
        let dir = TempDir::new().unwrap();
        let body: String = (0..60).map(|i| format!("    line_{i} = {i}\n")).collect();
        fs::write(dir.path().join("huge.py"), format!("def huge():\n{body}")).unwrap();
        let mut options = BuildOptions::default();
        options.include_sources = true;
        let index = ProjectIndex::build(dir.path(), &Settings::default(), options);

        let huge = SymbolId::new("huge.py", "huge");
        let candidates = vec![Candidate { symbol_id: huge, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        opts.compress = Compress::ChunkSummary;

        let result = pack(dir.path(), &index, &candidates, 5000, &opts, &estimator);
        assert_eq!(result.slices.len(), 1);
        let slice = &result.slices[0];
        assert!(slice.code.is_none());
        assert!(slice.meta.summary.as_deref().is_some_and(|s| s.contains("blocks elided")));
    }

    #[test]
    fn identical_signature_and_code_produce_identical_etag() {
        let a = fingerprint("def foo():", Some("return 1"));
        let b = fingerprint("def foo():", Some("return 1"));
        assert_eq!(a, b);
        let c = fingerprint("def foo():", Some("return 2"));
        assert_ne!(a, c);
    }

    #[test]
    fn signature_fingerprint_ignores_code_changes() {
        let sig = "def foo():".to_string();
        let a = ContextSlice {
            id: SymbolId::new("a.py", "foo"),
            signature: sig.clone(),
            lines: (1, 3),
            relevance: "diff".to_string(),
            code: Some("return 1".to_string()),
            etag: fingerprint(&sig, Some("return 1")),
            meta: SliceMeta::default(),
        };
        let mut b = a.clone();
        b.code = Some("return 2, a much longer different body".to_string());
        b.etag = fingerprint(&sig, b.code.as_deref());

        assert_ne!(a.etag, b.etag);
        assert_ne!(project_fingerprint(&[a.clone()]), project_fingerprint(&[b.clone()]));
        assert_eq!(signature_fingerprint(&[a]), signature_fingerprint(&[b]));
    }

    /// Regression: a candidate's `diff_lines` are absolute file line
    /// numbers, but the Block Compressor scores blocks numbered from the
    /// start of the extracted body. A symbol starting well past line 1 of
    /// its file must still have its diff-touched block kept under
    /// compression, not silently dropped by a line-number mismatch.
    #[test]
    fn compression_keeps_diff_block_for_symbol_not_at_line_one() {
        let dir = TempDir::new().unwrap();
        let mut source = String::from("PREAMBLE = 1\n\n\n\ndef huge():\n");
        for group in 0..20 {
            for i in 0..4 {
                source.push_str(&format!("    filler_{group}_{i} = {i}\n"));
            }
            source.push('\n');
        }
        source.push_str("    if marker_condition:\n        touched_by_diff = True\n\n");
        for group in 20..40 {
            for i in 0..4 {
                source.push_str(&format!("    filler_{group}_{i} = {i}\n"));
            }
            source.push('\n');
        }
        fs::write(dir.path().join("huge.py"), &source).unwrap();

        let mut options = BuildOptions::default();
        options.include_sources = true;
        let index = ProjectIndex::build(dir.path(), &Settings::default(), options);
        let huge = SymbolId::new("huge.py", "huge");
        let symbol = index.symbol(&huge).unwrap();
        assert!(symbol.line_start() > 1, "fixture must exercise a non-zero symbol offset");

        let diff_line = source.lines().position(|l| l.contains("touched_by_diff")).unwrap() as u32 + 1;
        let candidates = vec![Candidate {
            symbol_id: huge,
            relevance: Relevance::ContainsDiff,
            diff_lines: vec![(diff_line, diff_line)],
        }];

        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        opts.compress = Compress::Blocks;
        let result = pack(dir.path(), &index, &candidates, 5000, &opts, &estimator);

        let code = result.slices[0].code.as_ref().expect("compressed body still included");
        assert!(code.contains("touched_by_diff"), "diff-touched block must survive compression");
    }

    /// JSON round-trip law (spec §8): serializing a `ContextPack` via its
    /// own derive, re-parsing, and re-serializing yields identical bytes.
    #[test]
    fn context_pack_json_round_trips() {
        let (dir, index) = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = vec![Candidate { symbol_id: foo, relevance: Relevance::ContainsDiff, diff_lines: vec![] }];
        let estimator = tokens::HeuristicEstimator;
        let mut opts = PackOptions::default();
        opts.zoom = Zoom::Full;
        let pack_result = pack(dir.path(), &index, &candidates, 1000, &opts, &estimator);

        let once = serde_json::to_string(&pack_result).unwrap();
        let reparsed: ContextPack = serde_json::from_str(&once).unwrap();
        let twice = serde_json::to_string(&reparsed).unwrap();
        assert_eq!(once, twice);
    }
}
