mod common;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qr_reader::Binarizer;

fn bench_binarizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("black_matrix");
    for (width, height) in [(100, 100), (640, 480), (1920, 1080)] {
        let source = common::frame_with_code("BINARIZE ME", width, height, 10, 10, 3);
        let id = format!("{width}x{height}");
        group.bench_with_input(BenchmarkId::new("hybrid", &id), &source, |b, source| {
            b.iter(|| Binarizer::Hybrid.black_matrix(black_box(source)))
        });
        group.bench_with_input(BenchmarkId::new("histogram", &id), &source, |b, source| {
            b.iter(|| Binarizer::GlobalHistogram.black_matrix(black_box(source)))
        });
    }
    group.finish();
}

fn bench_noise(c: &mut Criterion) {
    let source = common::noise_frame(640, 480);
    c.bench_function("hybrid_noise_640x480", |b| {
        b.iter(|| Binarizer::Hybrid.black_matrix(black_box(&source)))
    });
}

criterion_group!(benches, bench_binarizers, bench_noise);
criterion_main!(benches);
