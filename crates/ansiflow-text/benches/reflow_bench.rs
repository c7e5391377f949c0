//! Benchmarks for reflow, tab expansion and control stripping.
//!
//! Run with: cargo bench -p ansiflow-text

use ansiflow_text::{
    ReflowOptions, TabStops, TextOptions, WarnPolicy, display_width, expand_tabs, reflow,
    strip_controls,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

// =============================================================================
// Test Data
// =============================================================================

/// Plain prose of roughly `len` bytes.
fn ascii_text(len: usize) -> String {
    "The quick brown fox jumps over the lazy dog. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Prose with a colour change every few words.
fn styled_text(len: usize) -> String {
    "\x1b[31mThe quick \x1b[1mbrown\x1b[22m fox \x1b[38;5;33mjumps\x1b[0m over the lazy dog. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Mixed ASCII and CJK
fn mixed_text(len: usize) -> String {
    "Hello \u{4E16}\u{754C}! Test \u{6D4B}\u{8BD5}. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Tab separated columns.
fn tabbed_text(len: usize) -> String {
    "name\tsize\tmodified\n".chars().cycle().take(len).collect()
}

fn quiet() -> TextOptions {
    TextOptions::new().warn(WarnPolicy::Silent)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_reflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("reflow/width_40");
    let reflow_opts = ReflowOptions::new(40);
    let opts = quiet();

    for len in [100, 1000, 10000] {
        for (name, text) in [
            ("ascii", ascii_text(len)),
            ("styled", styled_text(len)),
            ("mixed", mixed_text(len)),
        ] {
            group.throughput(Throughput::Bytes(text.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, len), &text, |b, text| {
                b.iter(|| black_box(reflow(&[text.as_str()], &reflow_opts, &opts)))
            });
        }
    }

    group.finish();
}

fn bench_reflow_wrap_always(c: &mut Criterion) {
    let mut group = c.benchmark_group("reflow/wrap_always");
    let reflow_opts = ReflowOptions::new(16).wrap_always(true).pad(Some(' '));
    let opts = quiet();

    for len in [100, 1000, 10000] {
        let text = styled_text(len);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            b.iter(|| black_box(reflow(&[text.as_str()], &reflow_opts, &opts)))
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("reflow/batch");
    let reflow_opts = ReflowOptions::new(30).prefix("> ");
    let opts = quiet();

    for count in [10, 100, 1000] {
        let batch: Vec<String> = (0..count).map(|_| styled_text(120)).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &batch, |b, batch| {
            b.iter(|| black_box(reflow(batch, &reflow_opts, &opts)))
        });
    }

    group.finish();
}

fn bench_expand_tabs(c: &mut Criterion) {
    let mut group = c.benchmark_group("tabs/expand");
    let opts = quiet();

    for (name, stops) in [
        ("uniform_8", TabStops::default()),
        ("table_4_12", TabStops::new([4, 12]).unwrap_or_default()),
    ] {
        let text = tabbed_text(1000);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| black_box(expand_tabs(&[text.as_str()], &stops, &opts)))
        });
    }

    group.finish();
}

fn bench_strip_and_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("controls");
    let opts = quiet();
    let text = styled_text(1000);
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("strip", |b| {
        b.iter(|| black_box(strip_controls(&[text.as_str()], &opts)))
    });
    group.bench_function("display_width", |b| {
        b.iter(|| black_box(display_width(text.as_bytes(), &opts)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reflow,
    bench_reflow_wrap_always,
    bench_batch,
    bench_expand_tabs,
    bench_strip_and_measure,
);

criterion_main!(benches);
