use std::hint::black_box;

use common::Buffer2;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shipdet::{BlobClusterer, CellAveragingCfar, CfarMethod, MeanShiftConfig, ThresholdStrategy};

fn noise_tile(size: usize) -> Buffer2<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    Buffer2::from_fn(size, size, |_, _| rng.random_range(1..40u8))
}

fn cfar_benchmarks(c: &mut Criterion) {
    let tile = noise_tile(256);
    let mut mask = Buffer2::new_default(256, 256);

    let mut group = c.benchmark_group("cfar_256");
    for (guard, neighbour) in [(5, 7), (9, 21)] {
        for method in [CfarMethod::Mask, CfarMethod::RunningSum] {
            let strategy = ThresholdStrategy::from(
                CellAveragingCfar::new(guard, neighbour, 2.5, method).expect("valid cfar"),
            );
            group.bench_function(BenchmarkId::new(method.to_string(), format!("{guard}x{neighbour}")), |b| {
                b.iter(|| strategy.apply(black_box(&tile), &mut mask))
            });
        }
    }
    group.finish();
}

fn cluster_benchmarks(c: &mut Criterion) {
    // Sparse mask: 40 small blobs on a 512x512 raster.
    let mut mask = Buffer2::new_default(512, 512);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let (x0, y0) = (rng.random_range(0..508), rng.random_range(0..508));
        for y in y0..y0 + 4 {
            for x in x0..x0 + 4 {
                mask[(x, y)] = 255u8;
            }
        }
    }

    let mut group = c.benchmark_group("cluster_512");
    let clusterers = [
        ("connected_components", BlobClusterer::default()),
        (
            "mean_shift",
            BlobClusterer::from(MeanShiftConfig::new(10.0, 0.5, 1000).expect("valid mean shift")),
        ),
    ];
    for (name, clusterer) in clusterers {
        group.bench_function(name, |b| b.iter(|| clusterer.detect(black_box(&mask))));
    }
    group.finish();
}

criterion_group!(benches, cfar_benchmarks, cluster_benchmarks);
criterion_main!(benches);
