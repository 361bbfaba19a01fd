use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;
use tldrs::candidates::{build_candidates, Relevance};
use tldrs::config::Settings;
use tldrs::index::{BuildOptions, ProjectIndex};
use tldrs::pack::tokens::HeuristicEstimator;
use tldrs::pack::{pack, PackOptions};
use tldrs::SymbolId;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut body = String::new();
    for i in 0..200 {
        body.push_str(&format!("def fn_{i}():\n    x = {i}\n    if x > 0:\n        return helper_{i}(x)\n    return 0\n\n\n"));
        body.push_str(&format!("def helper_{i}(x):\n    return x * 2\n\n\n"));
    }
    fs::write(dir.path().join("big.py"), body).unwrap();
    dir
}

fn pack_benchmark(c: &mut Criterion) {
    let dir = fixture();
    let mut options = BuildOptions::default();
    options.include_sources = true;
    options.include_ranges = true;
    let index = ProjectIndex::build(dir.path(), &Settings::default(), options);
    let seed = SymbolId::new("big.py", "fn_0");
    let candidates = build_candidates(&index, vec![(seed, Relevance::ContainsDiff)], 3, &HashMap::new(), None);
    let estimator = HeuristicEstimator;
    let opts = PackOptions::default();

    c.bench_function("pack 200-function file at depth 3", |b| {
        b.iter(|| pack(dir.path(), black_box(&index), black_box(&candidates), black_box(4000), &opts, &estimator))
    });
}

criterion_group!(benches, pack_benchmark);
criterion_main!(benches);
