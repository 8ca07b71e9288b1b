// Benchmarks for the segmentation pipeline.

use criterion::{criterion_group, criterion_main, Criterion};
use lineardoc::segment;

fn boundaries(text: &str, _language: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut result = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() {
                result.push(j);
                i = j;
                continue;
            }
        }
        i += 1;
    }
    result
}

fn bench_simple(c: &mut Criterion) {
    let html = "<h2>Heading</h2><p>This is a <b>simple</b> document. It has two sentences.</p>";
    c.bench_function("simple_document", |b| {
        b.iter(|| segment(html, &boundaries).unwrap());
    });
}

criterion_group!(benches, bench_simple);
criterion_main!(benches);
