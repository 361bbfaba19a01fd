//! Text serializer (spec §4.8): human-readable, no caching guarantees.

use crate::pack::ContextPack;
use std::fmt::Write;

pub fn render(pack: &ContextPack) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# pack: budget={} used={} project={}", pack.budget, pack.budget_used, pack.project_fingerprint);

    for slice in &pack.slices {
        let unchanged = pack.unchanged.as_ref().is_some_and(|u| u.contains(&slice.id));
        let _ = writeln!(out);
        let _ = writeln!(out, "## {} [{}] lines {}-{}", slice.id, slice.relevance, slice.lines.0, slice.lines.1);
        let _ = writeln!(out, "{}", slice.signature);
        if unchanged {
            let _ = writeln!(out, "(unchanged since last turn)");
        } else if let Some(code) = &slice.code {
            let _ = writeln!(out, "{code}");
        } else {
            let _ = writeln!(out, "(signature only)");
        }
    }

    if let Some(unchanged) = &pack.unchanged {
        let _ = writeln!(out);
        let _ = writeln!(out, "# unchanged: {}", unchanged.len());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{CacheStats, ContextSlice, SliceMeta};
    use crate::types::SymbolId;

    #[test]
    fn renders_one_block_per_slice() {
        let pack = ContextPack {
            slices: vec![ContextSlice {
                id: SymbolId::new("a.py", "foo"),
                signature: "def foo():".to_string(),
                lines: (1, 3),
                relevance: "diff".to_string(),
                code: Some("return 1".to_string()),
                etag: "abc".to_string(),
                meta: SliceMeta::default(),
            }],
            budget: 100,
            budget_used: 10,
            unchanged: None,
            cache_stats: CacheStats { hits: 0, misses: 1, hit_rate: 0.0 },
            project_fingerprint: "deadbeef".to_string(),
        };
        let rendered = render(&pack);
        assert!(rendered.contains("def foo():"));
        assert!(rendered.contains("return 1"));
    }
}
