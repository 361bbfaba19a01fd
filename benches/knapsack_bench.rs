use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tldrs::compress::{compress_body, CompressHints};
use tldrs::Language;

fn big_body() -> String {
    let mut body = String::new();
    for i in 0..300 {
        body.push_str(&format!("    value_{i} = {i}\n    if value_{i} > 100:\n        return value_{i}\n\n"));
    }
    body
}

fn estimate(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}

fn knapsack_benchmark(c: &mut Criterion) {
    let body = big_body();
    let hints = CompressHints { diff_lines: &[(50, 55)], call_edge_identifiers: &[] };

    c.bench_function("compress_body on 300-block function", |b| {
        b.iter(|| compress_body(black_box(&body), Language::Python, black_box(200), &hints, estimate))
    });
}

criterion_group!(benches, knapsack_benchmark);
criterion_main!(benches);
