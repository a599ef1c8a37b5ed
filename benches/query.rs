//! Criterion benchmarks for the spatial query and one animated frame.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use darp::config::{DivergenceConfig, ExplorerConfig, MultimodalConfig};
use darp::demos::{Divergence, Multimodal};
use darp::prng::Prng;
use darp::query::nearest;
use darp::scheduler::Animate;
use darp::store::PointStore;
use darp::Vec2;

fn vortex(count: usize, seed: u64) -> PointStore {
    let cfg = ExplorerConfig {
        point_count: count,
        ..ExplorerConfig::default()
    };
    PointStore::generate(&cfg.layout(), &mut Prng::new(seed))
}

/// Benchmark nearest() with varying store sizes.
fn bench_nearest_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_size");

    for size in [150, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("k5", size), size, |b, &size| {
            let store = vortex(size, 42);
            let q = Vec2::new(400.0, 200.0);
            b.iter(|| black_box(nearest(store.records(), black_box(q), 5).len()));
        });
    }

    group.finish();
}

/// Benchmark one advance() of each animated demo.
fn bench_demo_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("demo_frame");

    group.bench_function("divergence", |b| {
        let mut demo = Divergence::new(DivergenceConfig::default(), Prng::new(42));
        b.iter(|| {
            demo.advance(0.016);
            black_box(demo.corrected_likelihood())
        });
    });

    group.bench_function("multimodal", |b| {
        let mut demo = Multimodal::new(MultimodalConfig::default(), Prng::new(42));
        b.iter(|| {
            demo.advance(0.02);
            black_box(demo.multimodal_frame().overlay.modes_alpha)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_nearest_sizes, bench_demo_frames);
criterion_main!(benches);
