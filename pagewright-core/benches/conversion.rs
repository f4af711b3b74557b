//! Conversion benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pagewright_core::encoder::PageRenderer;
use pagewright_core::layout::{page_blocks, ContentClassifier};
use pagewright_core::types::{PageArtifact, Position, TextRun};

const PAGE_HEIGHT: f32 = 792.0;

/// A page of body text with a title, a heading, and a footer
fn sample_runs(lines: usize) -> Vec<TextRun> {
    let mut runs = vec![
        TextRun::new("Chapter Title", 24.0, Position::new(72.0, 60.0)),
        TextRun::new("Section", 16.0, Position::new(72.0, 100.0)).bold(),
    ];
    for i in 0..lines {
        let y = 120.0 + i as f32 * 12.0;
        runs.push(TextRun::new(
            format!("line {} of body text & more", i),
            11.0,
            Position::new(72.0, y.min(700.0)),
        ));
    }
    runs.push(TextRun::new("17", 9.0, Position::new(300.0, 770.0)));
    runs
}

fn classification_benchmark(c: &mut Criterion) {
    let classifier = ContentClassifier::default();
    let mut group = c.benchmark_group("classify_and_merge");
    for lines in [10, 50, 200] {
        let runs = sample_runs(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &runs, |b, runs| {
            b.iter(|| page_blocks(&classifier, std::hint::black_box(runs), PAGE_HEIGHT))
        });
    }
    group.finish();
}

fn render_benchmark(c: &mut Criterion) {
    let classifier = ContentClassifier::default();
    let renderer = PageRenderer::default();
    let page = PageArtifact::new(0, page_blocks(&classifier, &sample_runs(50), PAGE_HEIGHT));

    c.bench_function("render_page", |b| {
        b.iter(|| renderer.render(std::hint::black_box(&page)))
    });
}

criterion_group!(benches, classification_benchmark, render_benchmark);
criterion_main!(benches);
