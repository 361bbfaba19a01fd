//! Candidate Builder (spec §4.4): expands a seed set outward along the
//! call graph up to a configured depth, tagging each reached symbol with a
//! relevance tag that governs final ordering.

use crate::index::ProjectIndex;
use crate::types::SymbolId;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub enum Relevance {
    ContainsDiff,
    EntryPoint,
    Match(f32),
    CallerOfDiff,
    CalleeOfDiff,
    DepthK(u8),
}

impl Relevance {
    /// Lower is more relevant. `ContainsDiff(0) < EntryPoint(1) < Match(2) <
    /// CallerOfDiff(3) < CalleeOfDiff(4) < DepthK(5+k)` per spec §4.4.
    pub fn priority(&self) -> u16 {
        match self {
            Relevance::ContainsDiff => 0,
            Relevance::EntryPoint => 1,
            Relevance::Match(_) => 2,
            Relevance::CallerOfDiff => 3,
            Relevance::CalleeOfDiff => 4,
            Relevance::DepthK(k) => 5 + *k as u16,
        }
    }

    /// Short tag used by serializers (spec §3 `ContextSlice.relevance`).
    pub fn short_tag(&self) -> String {
        match self {
            Relevance::ContainsDiff => "diff".to_string(),
            Relevance::EntryPoint => "entry".to_string(),
            Relevance::Match(score) => format!("match:{score:.2}"),
            Relevance::CallerOfDiff => "caller".to_string(),
            Relevance::CalleeOfDiff => "callee".to_string(),
            Relevance::DepthK(k) => format!("depth:{k}"),
        }
    }

    fn for_child(&self, via_reverse_edge: bool) -> Relevance {
        match self {
            Relevance::EntryPoint => Relevance::DepthK(1),
            Relevance::DepthK(k) => Relevance::DepthK(k + 1),
            _ => {
                if via_reverse_edge {
                    Relevance::CallerOfDiff
                } else {
                    Relevance::CalleeOfDiff
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub symbol_id: SymbolId,
    pub relevance: Relevance,
    pub diff_lines: Vec<(u32, u32)>,
}

struct WorkItem {
    id: SymbolId,
    depth_remaining: u8,
    relevance: Relevance,
}

/// Expands `seed` outward along the call graph to `depth`, producing one
/// `Candidate` per reached symbol carrying the best (lowest-numbered)
/// priority reached during expansion. Uses a tagged BFS with an
/// "already expanded" set rather than recursion (spec §9 "Cyclic graphs").
pub fn build_candidates(
    index: &ProjectIndex,
    seed: Vec<(SymbolId, Relevance)>,
    depth: u8,
    diff_lines: &HashMap<SymbolId, Vec<(u32, u32)>>,
    max_candidates: Option<usize>,
) -> Vec<Candidate> {
    let mut best: HashMap<SymbolId, Relevance> = HashMap::new();
    let mut expanded: HashSet<SymbolId> = HashSet::new();
    let mut queue: VecDeque<WorkItem> = VecDeque::new();

    for (id, relevance) in seed {
        queue.push_back(WorkItem { id, depth_remaining: depth, relevance });
    }

    while let Some(item) = queue.pop_front() {
        let is_better = match best.get(&item.id) {
            Some(existing) => item.relevance.priority() < existing.priority(),
            None => true,
        };
        if is_better {
            best.insert(item.id.clone(), item.relevance.clone());
        }

        if expanded.contains(&item.id) || item.depth_remaining == 0 {
            continue;
        }
        expanded.insert(item.id.clone());

        if let Some(callees) = index.forward_calls.get(&item.id) {
            for callee in callees {
                queue.push_back(WorkItem {
                    id: callee.clone(),
                    depth_remaining: item.depth_remaining - 1,
                    relevance: item.relevance.for_child(false),
                });
            }
        }
        for caller in index.reverse_calls_for(&item.id) {
            queue.push_back(WorkItem {
                id: caller,
                depth_remaining: item.depth_remaining - 1,
                relevance: item.relevance.for_child(true),
            });
        }
    }

    let mut candidates: Vec<Candidate> = best
        .into_iter()
        .map(|(symbol_id, relevance)| {
            let lines = diff_lines.get(&symbol_id).cloned().unwrap_or_default();
            Candidate { symbol_id, relevance, diff_lines: lines }
        })
        .collect();

    candidates.sort_by(|a, b| {
        let (fa, la) = index.symbol(&a.symbol_id).map(|s| (s.file.as_ref(), s.line_start())).unwrap_or(("", 0));
        let (fb, lb) = index.symbol(&b.symbol_id).map(|s| (s.file.as_ref(), s.line_start())).unwrap_or(("", 0));
        (a.relevance.priority(), fa, la, a.symbol_id.as_str())
            .cmp(&(b.relevance.priority(), fb, lb, b.symbol_id.as_str()))
    });

    if let Some(cap) = max_candidates {
        candidates.truncate(cap);
    }

    candidates
}

/// Default cap derived from a budget and a per-candidate token floor
/// (spec §4.4 step 4: "default derived from budget and a per-candidate
/// floor").
pub fn default_cap(budget: u32, per_candidate_floor: u32) -> usize {
    if per_candidate_floor == 0 {
        return usize::MAX;
    }
    (budget / per_candidate_floor).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::index::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn build_fixture() -> ProjectIndex {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def foo():\n    bar()\n\n\ndef bar():\n    baz()\n\n\ndef baz():\n    pass\n\n\ndef unrelated():\n    pass\n",
        )
        .unwrap();
        let mut options = BuildOptions::default();
        options.include_reverse_adjacency = true;
        ProjectIndex::build(dir.path(), &Settings::default(), options)
    }

    #[test]
    fn depth_zero_yields_exactly_the_seed() {
        let index = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = build_candidates(&index, vec![(foo.clone(), Relevance::ContainsDiff)], 0, &HashMap::new(), None);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].symbol_id, foo);
    }

    #[test]
    fn expands_callees_with_callee_tag() {
        let index = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = build_candidates(&index, vec![(foo, Relevance::ContainsDiff)], 2, &HashMap::new(), None);
        let bar = candidates.iter().find(|c| c.symbol_id.as_str() == "a.py:bar").unwrap();
        assert_eq!(bar.relevance, Relevance::CalleeOfDiff);
        assert!(!candidates.iter().any(|c| c.symbol_id.as_str() == "a.py:unrelated"));
    }

    #[test]
    fn ordering_respects_priority_then_location() {
        let index = build_fixture();
        let foo = SymbolId::new("a.py", "foo");
        let candidates = build_candidates(&index, vec![(foo, Relevance::ContainsDiff)], 2, &HashMap::new(), None);
        assert_eq!(candidates[0].relevance.priority(), 0);
        for w in candidates.windows(2) {
            assert!(w[0].relevance.priority() <= w[1].relevance.priority());
        }
    }
}
