//! Project Index (spec §4.2): scans a workspace once into a symbol table,
//! name index, file index, range index, and forward/reverse call graph.
//! Immutable after construction — shareable by reference across concurrent
//! requests without locks (spec §5).

mod calls;
mod walker;

use crate::config::Settings;
use crate::extract::{self, ExtractedFile};
use crate::symbol::Symbol;
use crate::types::{Language, SymbolId};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub include_sources: bool,
    pub include_ranges: bool,
    pub include_reverse_adjacency: bool,
    pub language_hint: Option<Language>,
}

pub struct ProjectIndex {
    pub symbols: HashMap<SymbolId, Symbol>,
    pub name_index: HashMap<String, Vec<SymbolId>>,
    pub file_index: HashMap<String, Vec<SymbolId>>,
    pub range_index: HashMap<SymbolId, (u32, u32)>,
    pub imports: HashMap<String, Vec<String>>,
    pub forward_calls: HashMap<SymbolId, Vec<SymbolId>>,
    reverse_calls: RwLock<Option<HashMap<SymbolId, Vec<SymbolId>>>>,
    pub source_cache: Option<HashMap<String, String>>,
    pub signature_overrides: HashMap<SymbolId, Box<str>>,
    pub file_count: usize,
    pub failed_files: usize,
}

impl ProjectIndex {
    /// Builds a fresh index from a workspace snapshot. Per-file extraction
    /// failures are logged and skipped (spec §4.2: "never abort the build").
    /// An empty workspace yields an empty index.
    pub fn build(workspace: &Path, settings: &Settings, options: BuildOptions) -> Self {
        let files = walker::enumerate(workspace, &settings.indexing);

        let parsed: Vec<(String, Language, ExtractedFile, String)> = files
            .par_iter()
            .filter_map(|path| {
                let language = options.language_hint.unwrap_or_else(|| Language::from_path(path));
                let source = std::fs::read_to_string(path).ok()?;
                let rel = relative_path(workspace, path);
                match extract::extract(&rel, language, &source) {
                    Ok(extracted) => Some((rel, language, extracted, source)),
                    Err(cause) => {
                        warn!(path = %rel, %cause, "extraction failed, skipping file");
                        None
                    }
                }
            })
            .collect();

        let mut parsed = parsed;
        parsed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut symbols: HashMap<SymbolId, Symbol> = HashMap::new();
        let mut file_index: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut imports: HashMap<String, Vec<String>> = HashMap::new();
        let mut source_cache: HashMap<String, String> = HashMap::new();
        let mut failed_files = 0usize;

        for (rel, _language, extracted, source) in &parsed {
            let mut ids_for_file = Vec::with_capacity(extracted.symbols.len());

            for symbol in &extracted.symbols {
                if symbols.contains_key(&symbol.id) {
                    warn!(id = %symbol.id, "duplicate SymbolId on extraction, keeping first occurrence");
                    failed_files += 1;
                    continue;
                }
                ids_for_file.push(symbol.id.clone());
                symbols.insert(symbol.id.clone(), symbol.clone());
            }
            ids_for_file.sort_by_key(|id| symbols[id].line_start());
            file_index.insert(rel.clone(), ids_for_file);
            imports.insert(rel.clone(), extracted.imports.clone());
            if options.include_sources {
                source_cache.insert(rel.clone(), source.clone());
            }
        }

        let mut name_index: HashMap<String, Vec<SymbolId>> = HashMap::new();
        for symbol in symbols.values() {
            name_index.entry(symbol.name.to_string()).or_default().push(symbol.id.clone());
        }
        for ids in name_index.values_mut() {
            ids.sort();
        }

        let range_index = if options.include_ranges {
            symbols.iter().map(|(id, s)| (id.clone(), (s.line_start(), s.line_end()))).collect()
        } else {
            HashMap::new()
        };

        let forward_calls = build_forward_calls(&parsed, &symbols, &name_index, &file_index);

        let reverse_calls = if options.include_reverse_adjacency {
            RwLock::new(Some(transpose(&forward_calls)))
        } else {
            RwLock::new(None)
        };

        Self {
            symbols,
            name_index,
            file_index,
            range_index,
            imports,
            forward_calls,
            reverse_calls,
            source_cache: options.include_sources.then_some(source_cache),
            signature_overrides: HashMap::new(),
            file_count: parsed.len(),
            failed_files,
        }
    }

    /// Reverse call graph, computed lazily on first lookup and memoized
    /// (spec §4.2 step 4 / §9 "reverse call graph ... computed lazily").
    pub fn reverse_calls_for(&self, id: &SymbolId) -> Vec<SymbolId> {
        {
            let guard = self.reverse_calls.read();
            if let Some(map) = guard.as_ref() {
                return map.get(id).cloned().unwrap_or_default();
            }
        }
        let computed = transpose(&self.forward_calls);
        let result = computed.get(id).cloned().unwrap_or_default();
        *self.reverse_calls.write() = Some(computed);
        result
    }

    pub fn symbol(&self, id: &SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// `spec.md §6` `ResolveEntry`: short name, qualified name, or
    /// `path:name` all resolve. Ambiguous short names return every match,
    /// sorted by `(file, line_start)`, for the caller to disambiguate.
    pub fn resolve_entry(&self, entry: &str) -> ResolveOutcome {
        if let Some(symbol) = self.symbols.get(&SymbolId::from_raw(entry.to_string())) {
            return ResolveOutcome::Resolved(symbol.id.clone());
        }
        if let Some(symbol) = self.symbols.values().find(|s| s.qualified_name.as_ref() == entry) {
            return ResolveOutcome::Resolved(symbol.id.clone());
        }
        match self.name_index.get(entry) {
            Some(ids) if ids.len() == 1 => ResolveOutcome::Resolved(ids[0].clone()),
            Some(ids) if ids.len() > 1 => {
                let mut candidates = ids.clone();
                candidates.sort_by(|a, b| {
                    let sa = &self.symbols[a];
                    let sb = &self.symbols[b];
                    (sa.file.as_ref(), sa.line_start()).cmp(&(sb.file.as_ref(), sb.line_start()))
                });
                ResolveOutcome::Ambiguous(candidates)
            }
            _ => ResolveOutcome::Unknown,
        }
    }
}

pub enum ResolveOutcome {
    Resolved(SymbolId),
    Ambiguous(Vec<SymbolId>),
    Unknown,
}

/// Relativizes an enumerated file path against `workspace`, normalized to
/// `/` separators — spec §3 mints every `SymbolId` as
/// `«relative_path»:«qualified_name»`, so this must run before a path is
/// used either to mint a `SymbolId` or as a `file_index`/`imports`/
/// `source_cache` key, or lookups by relative path (e.g. `diff::map_hunks`
/// against a hunk's relative `file`) never match.
fn relative_path(workspace: &Path, path: &Path) -> String {
    path.strip_prefix(workspace).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

fn build_forward_calls(
    parsed: &[(String, Language, ExtractedFile, String)],
    symbols: &HashMap<SymbolId, Symbol>,
    name_index: &HashMap<String, Vec<SymbolId>>,
    file_index: &HashMap<String, Vec<SymbolId>>,
) -> HashMap<SymbolId, Vec<SymbolId>> {
    let mut source_by_file: HashMap<String, &str> = HashMap::new();
    for (rel, _, _, source) in parsed {
        source_by_file.insert(rel.clone(), source.as_str());
    }

    let mut forward: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
    for (file, ids) in file_index {
        let Some(source) = source_by_file.get(file.as_str()) else { continue };
        for id in ids {
            let symbol = &symbols[id];
            let start = symbol.line_start().saturating_sub(1) as usize;
            let end = symbol.line_end() as usize;
            let body: String = source
                .lines()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect::<Vec<_>>()
                .join("\n");
            let mut callees = Vec::new();
            for name in calls::call_site_names(&body) {
                if name == symbol.name.as_ref() {
                    continue;
                }
                if let Some(callee) = calls::resolve_call(&name, file, name_index, symbols) {
                    if !callees.contains(&callee) {
                        callees.push(callee);
                    }
                }
            }
            if !callees.is_empty() {
                forward.insert(id.clone(), callees);
            }
        }
    }
    forward
}

fn transpose(forward: &HashMap<SymbolId, Vec<SymbolId>>) -> HashMap<SymbolId, Vec<SymbolId>> {
    let mut reverse: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
    for (caller, callees) in forward {
        for callee in callees {
            reverse.entry(callee.clone()).or_default().push(caller.clone());
        }
    }
    reverse
}
