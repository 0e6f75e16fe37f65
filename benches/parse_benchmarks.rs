//! Criterion benchmarks for the tokenizer and parser.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rillc::prelude::*;
use std::collections::HashSet;

const SAMPLE: &str = r#"
    using "collections.rill";

    struct Matrix {
        int rows;
        int cols;
        float[16] cells;

        new(int rows, int cols) { }
        float [](int index) { return cells[index]; }
        void []=(int index, float value) { cells[index] = value; }
    }

    float trace(Matrix m) {
        float total = 0.0;
        for (int i = 0; i < m.rows; i = i + 1) {
            total = total + m[i * m.cols + i];
        }
        return total;
    }
"#;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_sample", |b| {
        b.iter(|| {
            let mut diagnostics = DiagnosticsCollection::new();
            let tokens = tokenize(
                black_box(SAMPLE),
                "bench.rill",
                &mut diagnostics,
                &HashSet::new(),
            );
            black_box(tokens)
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let mut diagnostics = DiagnosticsCollection::new();
    let tokens = tokenize(SAMPLE, "bench.rill", &mut diagnostics, &HashSet::new());

    c.bench_function("parse_sample", |b| {
        b.iter(|| {
            let mut diagnostics = DiagnosticsCollection::new();
            let result = parse(black_box(tokens.clone()), "bench.rill", &mut diagnostics);
            black_box(result)
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    c.bench_function("parse_source_sample", |b| {
        b.iter(|| {
            let mut diagnostics = DiagnosticsCollection::new();
            let result = rillc::parse_source(black_box(SAMPLE), "bench.rill", &mut diagnostics);
            black_box(result)
        })
    });
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_pipeline);
criterion_main!(benches);
