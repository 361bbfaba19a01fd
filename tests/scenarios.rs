//! End-to-end scenarios exercising the full pipeline: index → diff mapping
//! or candidate expansion → pack → delta elision.

use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;
use tldrs::candidates::{build_candidates, Relevance};
use tldrs::config::Settings;
use tldrs::diff::{map_hunks, Hunk};
use tldrs::index::{BuildOptions, ProjectIndex};
use tldrs::pack::tokens::HeuristicEstimator;
use tldrs::pack::{pack, Compress, PackOptions, Zoom};
use tldrs::serialize::{self, OutputFormat};
use tldrs::SymbolId;

fn write_three_file_project(dir: &TempDir) {
    fs::write(
        dir.path().join("a.py"),
        "def foo():\n    return bar()\n\n\ndef baz():\n    return 1\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.py"), "def bar():\n    return 2\n").unwrap();
    fs::write(dir.path().join("c.py"), "def unrelated():\n    return 3\n").unwrap();
}

fn build_index(dir: &TempDir) -> ProjectIndex {
    let mut options = BuildOptions::default();
    options.include_sources = true;
    options.include_ranges = true;
    options.include_reverse_adjacency = true;
    ProjectIndex::build(dir.path(), &Settings::default(), options)
}

/// Scenario A (spec §8): `DiffPack` with depth=2, budget=400 orders
/// `foo`/`bar` (the touched symbols and their call neighbors) ahead of
/// `baz`, and `unrelated` never appears.
#[test]
fn scenario_a_diff_context() {
    let dir = TempDir::new().unwrap();
    write_three_file_project(&dir);
    let index = build_index(&dir);

    let hunk = Hunk { file: "a.py".to_string(), old_start: 2, old_count: 1, new_start: 2, new_count: 1 };
    let mapped = map_hunks(&index, &[hunk]);
    let diff_lines: HashMap<SymbolId, Vec<(u32, u32)>> = mapped.mapping.iter().cloned().collect();
    let seeded: Vec<(SymbolId, Relevance)> = mapped.mapping.into_iter().map(|(id, _)| (id, Relevance::ContainsDiff)).collect();

    let candidates = build_candidates(&index, seeded, 2, &diff_lines, None);
    let ids: Vec<&str> = candidates.iter().map(|c| c.symbol_id.as_str()).collect();

    assert!(ids.contains(&"a.py:foo"));
    assert!(ids.contains(&"b.py:bar"));
    assert!(!ids.contains(&"a.py:baz"));
    assert!(!ids.contains(&"c.py:unrelated"));

    let estimator = HeuristicEstimator;
    let mut opts = PackOptions::default();
    opts.zoom = Zoom::Full;
    let result = pack(dir.path(), &index, &candidates, 400, &opts, &estimator);
    assert!(result.unchanged.is_none());
}

/// Scenario B (spec §8): second `Pack` call with the same session and
/// unchanged source elides every body and reports all ids `unchanged`.
#[test]
fn scenario_b_delta_elision_across_turns() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def foo():\n    return bar()\n\n\ndef bar():\n    return 2\n").unwrap();
    let index = build_index(&dir);

    let foo = SymbolId::new("a.py", "foo");
    let candidates = build_candidates(&index, vec![(foo, Relevance::EntryPoint)], 1, &HashMap::new(), None);
    let estimator = HeuristicEstimator;
    let mut opts = PackOptions::default();
    opts.zoom = Zoom::Full;
    opts.session_id = Some("turn-test".to_string());

    let turn1 = pack(dir.path(), &index, &candidates, 500, &opts, &estimator);
    assert_eq!(turn1.unchanged, Some(vec![]));
    assert!(turn1.slices.iter().all(|s| s.code.is_some()));

    let turn2 = pack(dir.path(), &index, &candidates, 500, &opts, &estimator);
    let unchanged = turn2.unchanged.expect("delta mode stays active");
    assert_eq!(unchanged.len(), turn2.slices.len());
    assert!(turn2.slices.iter().all(|s| s.code.is_none()));
}

/// Scenario C (spec §8): a budget too small for the body still gets a
/// signature-only slice, never a hard failure.
#[test]
fn scenario_c_budget_forces_degradation() {
    let dir = TempDir::new().unwrap();
    let huge_body: String = (0..500).map(|i| format!("    line_{i} = {i}\n")).collect();
    fs::write(dir.path().join("huge.py"), format!("def huge():\n{huge_body}")).unwrap();
    let index = build_index(&dir);

    let huge = SymbolId::new("huge.py", "huge");
    let candidates = build_candidates(&index, vec![(huge, Relevance::EntryPoint)], 0, &HashMap::new(), None);
    let estimator = HeuristicEstimator;
    let mut opts = PackOptions::default();
    opts.zoom = Zoom::Full;
    opts.compress = Compress::None;

    let result = pack(dir.path(), &index, &candidates, 20, &opts, &estimator);
    assert_eq!(result.slices.len(), 1);
    assert!(result.slices[0].code.is_none());
    assert!(result.budget_used <= result.budget);
}

/// Scenario E (spec §6): an ambiguous short name surfaces every candidate.
#[test]
fn scenario_e_ambiguous_entry() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def handle():\n    pass\n").unwrap();
    fs::write(dir.path().join("b.py"), "def handle():\n    pass\n").unwrap();
    let index = build_index(&dir);

    match index.resolve_entry("handle") {
        tldrs::index::ResolveOutcome::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        tldrs::index::ResolveOutcome::Resolved(_) => panic!("expected Ambiguous, got Resolved"),
        tldrs::index::ResolveOutcome::Unknown => panic!("expected Ambiguous, got Unknown"),
    }
}

#[test]
fn boundary_empty_workspace_yields_zero_slices() {
    let dir = TempDir::new().unwrap();
    let index = build_index(&dir);
    let estimator = HeuristicEstimator;
    let result = pack(dir.path(), &index, &[], 500, &PackOptions::default(), &estimator);
    assert!(result.slices.is_empty());
    assert_eq!(result.budget_used, 0);
}

#[test]
fn boundary_unknown_seed_symbol_resolves_to_unknown() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
    let index = build_index(&dir);
    assert!(matches!(index.resolve_entry("does_not_exist"), tldrs::index::ResolveOutcome::Unknown));
}

/// Scenario D (spec §8): same index and seed serialize to identical
/// cache-friendly bytes across two calls; after the body of `foo` changes
/// (signature untouched), bytes before `CACHE_BREAKPOINT` still match the
/// earlier run, only the dynamic section and trailer differ.
#[test]
fn scenario_d_cache_friendly_determinism() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def foo():\n    return 1\n").unwrap();
    let index = build_index(&dir);

    let foo = SymbolId::new("a.py", "foo");
    let candidates = build_candidates(&index, vec![(foo.clone(), Relevance::EntryPoint)], 0, &HashMap::new(), None);
    let estimator = HeuristicEstimator;
    let mut opts = PackOptions::default();
    opts.zoom = Zoom::Full;

    let first = pack(dir.path(), &index, &candidates, 500, &opts, &estimator);
    let rendered_first = serialize::serialize(OutputFormat::CacheFriendly, &first, &index, &estimator);
    let rendered_first_again = serialize::serialize(OutputFormat::CacheFriendly, &first, &index, &estimator);
    assert_eq!(rendered_first, rendered_first_again, "identical pack must render identical bytes");

    fs::write(dir.path().join("a.py"), "def foo():\n    return 2  # body changed, signature did not\n").unwrap();
    let index2 = build_index(&dir);
    let candidates2 = build_candidates(&index2, vec![(foo, Relevance::EntryPoint)], 0, &HashMap::new(), None);
    let second = pack(dir.path(), &index2, &candidates2, 500, &opts, &estimator);
    let rendered_second = serialize::serialize(OutputFormat::CacheFriendly, &second, &index2, &estimator);

    let prefix_first = rendered_first.split("CACHE_BREAKPOINT").next().unwrap();
    let prefix_second = rendered_second.split("CACHE_BREAKPOINT").next().unwrap();
    assert_eq!(prefix_first, prefix_second, "prefix must survive a body-only change");
    assert_ne!(rendered_first, rendered_second, "dynamic section must reflect the new body");
}

/// Scenario F (spec §8): a candidate whose body exceeds the `Blocks`
/// compressor's soft ceiling gets compressed rather than degraded, keeping
/// the block that covers the diff line and reporting at least one dropped
/// block, with the final estimate within the local budget.
#[test]
fn scenario_f_block_compression() {
    let dir = TempDir::new().unwrap();
    // Blank-line-separated groups so the indent-based fallback segmenter
    // (no blank lines = one block, spec §4.6 step 1(b)) actually produces
    // more than one block for the knapsack to choose among.
    let mut body = String::from("def huge():\n");
    for group in 0..20 {
        for i in 0..4 {
            body.push_str(&format!("    filler_{group}_{i} = {i}\n"));
        }
        body.push('\n');
    }
    body.push_str("    if marker_condition:\n        touched_by_diff = True\n\n");
    for group in 20..40 {
        for i in 0..4 {
            body.push_str(&format!("    filler_{group}_{i} = {i}\n"));
        }
        body.push('\n');
    }
    fs::write(dir.path().join("huge.py"), &body).unwrap();
    let index = build_index(&dir);

    let diff_line = body.lines().position(|l| l.contains("touched_by_diff")).unwrap() as u32 + 1;
    let huge = SymbolId::new("huge.py", "huge");
    let mut diff_lines = HashMap::new();
    diff_lines.insert(huge.clone(), vec![(diff_line, diff_line)]);
    let candidates = build_candidates(&index, vec![(huge, Relevance::ContainsDiff)], 0, &diff_lines, None);

    let estimator = HeuristicEstimator;
    let mut opts = PackOptions::default();
    opts.zoom = Zoom::Full;
    opts.compress = Compress::Blocks;

    let result = pack(dir.path(), &index, &candidates, 5000, &opts, &estimator);
    assert_eq!(result.slices.len(), 1);
    let slice = &result.slices[0];
    let code = slice.code.as_ref().expect("compressed body still included, not degraded");
    assert!(code.contains("touched_by_diff"));
    assert!(code.contains("lines elided"));
    assert!(slice.meta.dropped_blocks > 0);
}

#[test]
fn boundary_depth_zero_yields_exactly_the_seed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def foo():\n    return bar()\n\n\ndef bar():\n    pass\n").unwrap();
    let index = build_index(&dir);
    let foo = SymbolId::new("a.py", "foo");
    let candidates = build_candidates(&index, vec![(foo.clone(), Relevance::EntryPoint)], 0, &HashMap::new(), None);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].symbol_id, foo);
}
