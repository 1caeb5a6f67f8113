//! Criterion benchmarks for themekit critical paths
//!
//! Benchmarks the per-file work that dominates a build:
//! - Discovery: `{a,b}` brace expansion
//! - Lint: rule checks over a script
//! - Uglify: script minification
//! - Styles: stylesheet compile and prefix

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::Path;
use themekit::build::expand_braces;
use themekit::config::LintConfig;
use themekit::tasks::lint::lint_source;
use themekit::tasks::styles::{compile_css, prefix_css};
use themekit::tasks::uglify::minify_script;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Generate a script with n small functions
fn make_script(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                "// handler {i}\nfunction handler{i}(event) {{\n    var label = 'item-{i}';\n    if (event.type === 'click') {{ return label; }}\n    return /^item-\\d+$/.test(label);\n}}\n\n"
            )
        })
        .collect()
}

/// Generate a stylesheet with n nested rules
fn make_stylesheet(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                ".block-{i} {{\n  display: flex;\n  & .element {{ user-select: none; transition: transform 0.2s; }}\n}}\n"
            )
        })
        .collect()
}

// =============================================================================
// Discovery Benchmarks
// =============================================================================

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    group.bench_function("expand_flat", |b| {
        b.iter(|| expand_braces(black_box("src/img/**/*.{jpg,png,svg,gif,webp,ico}")))
    });
    group.bench_function("expand_nested", |b| {
        b.iter(|| expand_braces(black_box("src/{css,js/{lib,vendor}}/*.{css,js,map}")))
    });

    group.finish();
}

// =============================================================================
// Script Benchmarks
// =============================================================================

fn bench_scripts(c: &mut Criterion) {
    let mut group = c.benchmark_group("scripts");
    let rules = LintConfig::default();

    for size in [10, 100, 1000].iter() {
        let script = make_script(*size);
        group.throughput(Throughput::Bytes(script.len() as u64));
        group.bench_with_input(BenchmarkId::new("lint", size), &script, |b, script| {
            b.iter(|| lint_source(black_box(script), &rules))
        });
        group.bench_with_input(BenchmarkId::new("minify", size), &script, |b, script| {
            b.iter(|| minify_script(black_box(script)))
        });
    }

    group.finish();
}

// =============================================================================
// Stylesheet Benchmarks
// =============================================================================

fn bench_styles(c: &mut Criterion) {
    let mut group = c.benchmark_group("styles");
    let file = Path::new("bench.css");

    for size in [10, 100, 500].iter() {
        let css = make_stylesheet(*size);
        group.throughput(Throughput::Bytes(css.len() as u64));
        group.bench_with_input(BenchmarkId::new("compile", size), &css, |b, css| {
            b.iter(|| compile_css(file, black_box(css)))
        });

        let compiled = compile_css(file, &css).unwrap();
        group.bench_with_input(BenchmarkId::new("prefix_minify", size), &compiled, |b, css| {
            b.iter(|| prefix_css(file, black_box(css), true))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_scripts, bench_styles);

criterion_main!(benches);
