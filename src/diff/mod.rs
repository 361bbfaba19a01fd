//! Diff Mapper (spec §4.3): maps line-range hunks from an external diff
//! source to the symbols they overlap.

mod source;

pub use source::{DiffSource, GitDiffSource, StaticDiffSource};

use crate::index::ProjectIndex;
use crate::types::SymbolId;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Hunk {
    pub file: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl Hunk {
    pub fn new_range(&self) -> (u32, u32) {
        if self.new_count == 0 {
            (self.new_start, self.new_start)
        } else {
            (self.new_start, self.new_start + self.new_count - 1)
        }
    }
}

pub struct MapHunksResult {
    pub mapping: Vec<(SymbolId, Vec<(u32, u32)>)>,
    pub unmatched: Vec<Hunk>,
}

/// Groups `hunks` by file and, for each file's symbol ranges (sorted by
/// `file_index`), performs a linear two-pointer sweep: a hunk overlaps a
/// symbol when its new range intersects `[line_start, line_end]`. A hunk
/// may map to more than one symbol (e.g. a class and one of its methods);
/// hunks touching no symbol (top-level imports, module docstrings) are
/// collected into `unmatched`.
pub fn map_hunks(index: &ProjectIndex, hunks: &[Hunk]) -> MapHunksResult {
    let mut by_file: HashMap<&str, Vec<&Hunk>> = HashMap::new();
    for hunk in hunks {
        by_file.entry(hunk.file.as_str()).or_default().push(hunk);
    }

    let mut mapping: Vec<(SymbolId, Vec<(u32, u32)>)> = Vec::new();
    let mut per_symbol: HashMap<SymbolId, Vec<(u32, u32)>> = HashMap::new();
    let mut unmatched = Vec::new();

    for (file, file_hunks) in &by_file {
        let Some(ids) = index.file_index.get(*file) else {
            unmatched.extend(file_hunks.iter().map(|h| (*h).clone()));
            continue;
        };

        for hunk in file_hunks {
            let (new_start, new_end) = hunk.new_range();
            let mut matched_any = false;
            for id in ids {
                let Some(symbol) = index.symbol(id) else { continue };
                if let Some(clipped) = symbol.range.clip(new_start, new_end) {
                    matched_any = true;
                    per_symbol.entry(id.clone()).or_default().push(clipped);
                }
            }
            if !matched_any {
                unmatched.push((*hunk).clone());
            }
        }
    }

    // Stable ordering: mapping sorted by (file, line_start).
    let mut entries: Vec<(SymbolId, Vec<(u32, u32)>)> = per_symbol.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| {
        let sa = index.symbol(a);
        let sb = index.symbol(b);
        match (sa, sb) {
            (Some(sa), Some(sb)) => (sa.file.as_ref(), sa.line_start()).cmp(&(sb.file.as_ref(), sb.line_start())),
            _ => a.as_str().cmp(b.as_str()),
        }
    });
    mapping.extend(entries);

    MapHunksResult { mapping, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::index::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hunk_inside_symbol_maps_with_clipped_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    x = 1\n    y = 2\n    return x + y\n").unwrap();
        let mut options = BuildOptions::default();
        options.include_ranges = true;
        let index = ProjectIndex::build(dir.path(), &Settings::default(), options);

        let hunk = Hunk { file: "a.py".to_string(), old_start: 2, old_count: 1, new_start: 2, new_count: 1 };
        let result = map_hunks(&index, &[hunk]);
        assert_eq!(result.mapping.len(), 1);
        assert!(result.unmatched.is_empty());
        let (_, lines) = &result.mapping[0];
        assert_eq!(lines, &vec![(2, 2)]);
    }

    #[test]
    fn hunk_outside_any_symbol_is_unmatched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "import os\n\n\ndef foo():\n    pass\n").unwrap();
        let index = ProjectIndex::build(dir.path(), &Settings::default(), BuildOptions::default());

        let hunk = Hunk { file: "a.py".to_string(), old_start: 1, old_count: 1, new_start: 1, new_count: 1 };
        let result = map_hunks(&index, &[hunk]);
        assert!(result.mapping.is_empty());
        assert_eq!(result.unmatched.len(), 1);
    }
}
