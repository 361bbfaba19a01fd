//! Cache-friendly serializer (spec §4.8): a byte-deterministic layout whose
//! prefix (header through the breakpoint marker) depends only on which
//! symbols exist and their signatures, never on body content — this is what
//! lets an external prompt cache hit across turns even as bodies change.

use crate::pack::{self, ContextPack, ContextSlice, TokenEstimator};
use sha2::{Digest, Sha256};
use std::fmt::Write;

pub fn render(pack: &ContextPack, estimator: &dyn TokenEstimator) -> String {
    let mut ordered: Vec<&ContextSlice> = pack.slices.iter().collect();
    ordered.sort_by_key(|s| (s.id.file(), s.id.as_str()));

    // Signature-only fingerprint, not `pack.project_fingerprint` (which
    // folds in etags, which fold in code) — the header is part of the
    // stable prefix and must not move when only a body changes.
    let short_fingerprint: String = pack::signature_fingerprint(&pack.slices).chars().take(16).collect();
    let mut out = String::new();
    let _ = writeln!(out, "# context v1 :: project={short_fingerprint}");

    let mut prefix = String::new();
    for slice in &ordered {
        let marker = if pack.unchanged.as_ref().is_some_and(|u| u.contains(&slice.id)) { " [UNCHANGED]" } else { "" };
        let _ = writeln!(prefix, "{}: {}{marker}", slice.id, slice.signature);
    }

    let prefix_tokens = estimator.estimate(&prefix);
    let prefix_hash = hex16(&prefix);

    let _ = writeln!(
        out,
        "{{\"cache_hints\":{{\"prefix_tokens\":{prefix_tokens},\"prefix_hash\":\"{prefix_hash}\",\"format_version\":1}}}}"
    );
    out.push_str(&prefix);
    let _ = writeln!(out, "<!-- CACHE_BREAKPOINT: ~{prefix_tokens} tokens -->");

    let mut dynamic = String::new();
    for slice in &ordered {
        if let Some(code) = &slice.code {
            let _ = writeln!(dynamic, "### {}", slice.id);
            let _ = writeln!(dynamic, "```");
            let _ = writeln!(dynamic, "{code}");
            let _ = writeln!(dynamic, "```");
        }
    }
    let dynamic_tokens = estimator.estimate(&dynamic);
    out.push_str(&dynamic);

    let _ = writeln!(out, "## STATS: prefix\u{2248}{prefix_tokens} dynamic\u{2248}{dynamic_tokens} total\u{2248}{}", prefix_tokens + dynamic_tokens);

    out
}

fn hex16(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::tokens::HeuristicEstimator;
    use crate::pack::{CacheStats, SliceMeta};
    use crate::types::SymbolId;

    fn sample_pack(code_a: Option<&str>) -> ContextPack {
        let signature = "def foo():".to_string();
        let etag = pack::fingerprint(&signature, code_a);
        let slices = vec![ContextSlice {
            id: SymbolId::new("a.py", "foo"),
            signature,
            lines: (1, 3),
            relevance: "diff".to_string(),
            code: code_a.map(str::to_string),
            etag,
            meta: SliceMeta::default(),
        }];
        let project_fingerprint = pack::project_fingerprint(&slices);
        ContextPack {
            slices,
            budget: 100,
            budget_used: 10,
            unchanged: None,
            cache_stats: CacheStats { hits: 0, misses: 1, hit_rate: 0.0 },
            project_fingerprint,
        }
    }

    /// Same signature, different body: etag and `project_fingerprint` both
    /// change (they fold in code), but the header-through-breakpoint prefix
    /// must not — it is keyed on the signature-only fingerprint instead.
    #[test]
    fn prefix_is_stable_when_only_body_changes() {
        let estimator = HeuristicEstimator;
        let pack_a = sample_pack(Some("return 1"));
        let pack_b = sample_pack(Some("return 2 # totally different body, much longer"));
        assert_ne!(pack_a.project_fingerprint, pack_b.project_fingerprint);

        let a = render(&pack_a, &estimator);
        let b = render(&pack_b, &estimator);

        let prefix_a = a.split("CACHE_BREAKPOINT").next().unwrap();
        let prefix_b = b.split("CACHE_BREAKPOINT").next().unwrap();
        assert_eq!(prefix_a, prefix_b);
    }

    #[test]
    fn breakpoint_marker_present() {
        let estimator = HeuristicEstimator;
        let rendered = render(&sample_pack(Some("x")), &estimator);
        assert!(rendered.contains("CACHE_BREAKPOINT"));
        assert!(rendered.contains("## STATS:"));
    }
}
