//! JSON / Packed-JSON serializer (spec §4.8). Packed mode aliases field
//! names (`id→i`, `signature→g`, `code→c`, `relevance→r`, `lines→l`,
//! `etag→e`) and elides empty/null/zero fields per the sparsity invariant.

use crate::pack::ContextPack;
use serde_json::{json, Map, Value};

pub fn render(pack: &ContextPack, packed: bool) -> String {
    let value = to_value(pack, packed);
    serde_json::to_string(&value).unwrap_or_default()
}

fn to_value(pack: &ContextPack, packed: bool) -> Value {
    let slices: Vec<Value> = pack.slices.iter().map(|s| slice_value(s, pack, packed)).collect();

    let mut root = Map::new();
    root.insert("slices".to_string(), Value::Array(slices));
    root.insert("budget".to_string(), json!(pack.budget));
    root.insert("budget_used".to_string(), json!(pack.budget_used));
    if let Some(unchanged) = &pack.unchanged {
        root.insert("unchanged".to_string(), json!(unchanged.iter().map(|id| id.as_str()).collect::<Vec<_>>()));
    }
    root.insert(
        "cache_stats".to_string(),
        json!({
            "hits": pack.cache_stats.hits,
            "misses": pack.cache_stats.misses,
            "hit_rate": pack.cache_stats.hit_rate,
        }),
    );
    root.insert("project_fingerprint".to_string(), json!(pack.project_fingerprint));
    Value::Object(root)
}

fn slice_value(slice: &crate::pack::ContextSlice, pack: &ContextPack, packed: bool) -> Value {
    let mut obj = Map::new();
    let unchanged = pack.unchanged.as_ref().is_some_and(|u| u.contains(&slice.id));

    let id_key = if packed { "i" } else { "id" };
    let sig_key = if packed { "g" } else { "signature" };
    let code_key = if packed { "c" } else { "code" };
    let rel_key = if packed { "r" } else { "relevance" };
    let lines_key = if packed { "l" } else { "lines" };
    let etag_key = if packed { "e" } else { "etag" };

    obj.insert(id_key.to_string(), json!(slice.id.as_str()));
    obj.insert(sig_key.to_string(), json!(slice.signature));
    obj.insert(lines_key.to_string(), json!([slice.lines.0, slice.lines.1]));
    obj.insert(rel_key.to_string(), json!(slice.relevance));
    obj.insert(etag_key.to_string(), json!(slice.etag));

    if !unchanged {
        if let Some(code) = &slice.code {
            obj.insert(code_key.to_string(), json!(code));
        }
    }

    if !slice.meta.is_default() {
        let mut meta = Map::new();
        if slice.meta.block_count != 0 {
            meta.insert("block_count".to_string(), json!(slice.meta.block_count));
        }
        if slice.meta.dropped_blocks != 0 {
            meta.insert("dropped_blocks".to_string(), json!(slice.meta.dropped_blocks));
        }
        if !slice.meta.diff_lines.is_empty() {
            meta.insert("diff_lines".to_string(), json!(slice.meta.diff_lines));
        }
        if let Some(summary) = &slice.meta.summary {
            meta.insert("summary".to_string(), json!(summary));
        }
        if !meta.is_empty() {
            obj.insert("meta".to_string(), Value::Object(meta));
        }
    }

    Value::Object(obj)
}
