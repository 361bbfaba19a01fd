//! Forward call-graph construction (spec §4.2 step 3): scans each symbol's
//! body for call-site identifiers and resolves them against the name index
//! with the precedence the spec mandates. Unresolved names are dropped
//! silently; duplicate callees within one caller are deduplicated
//! preserving first occurrence.

use crate::symbol::Symbol;
use crate::types::SymbolId;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn call_site_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

/// Keywords that precede `(` in every supported language's control-flow
/// constructs; never real call targets.
const NOT_CALLS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "match", "return", "fn", "def", "function", "class",
    "struct", "enum", "impl", "sizeof", "typeof", "in", "case",
];

/// Identifiers appearing immediately before `(` within `body`, in source
/// order, deduplicated preserving first occurrence.
pub fn call_site_names(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for cap in call_site_pattern().captures_iter(body) {
        let name = &cap[1];
        if NOT_CALLS.contains(&name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

/// Resolves one call-site name to a `SymbolId` using the spec's precedence:
/// (a) exact qualified-name match, (b) unique short-name match project-wide,
/// (c) same-file short-name match, (d) drop.
pub fn resolve_call(
    name: &str,
    caller_file: &str,
    name_index: &HashMap<String, Vec<SymbolId>>,
    symbols: &HashMap<SymbolId, Symbol>,
) -> Option<SymbolId> {
    if let Some(ids) = name_index.get(name) {
        if let Some(qualified) = ids.iter().find(|id| id.split().1 == name) {
            return Some(qualified.clone());
        }
        if ids.len() == 1 {
            return Some(ids[0].clone());
        }
        if let Some(same_file) = ids.iter().find(|id| symbols.get(*id).map(|s| s.file.as_ref()) == Some(caller_file)) {
            return Some(same_file.clone());
        }
    }
    None
}
