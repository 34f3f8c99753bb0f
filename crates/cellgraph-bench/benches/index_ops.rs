//! Criterion micro-benchmarks for candidate index construction and queries.

use std::hint::black_box;

use cellgraph_bench::{registry, scattered_profile, voxel_block};
use cellgraph_core::CellIndex;
use cellgraph_space::{BruteForceIndex, CandidateIndex, SpatialGrid};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_grid_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_build");
    for side in [20usize, 50] {
        let reg = registry(voxel_block(side, 10));
        group.bench_with_input(BenchmarkId::from_parameter(reg.len()), &reg, |b, reg| {
            b.iter(|| SpatialGrid::build(black_box(reg.positions()), 1.5).unwrap());
        });
    }
    group.finish();
}

fn query_all(index: &dyn CandidateIndex, cells: usize) -> usize {
    let mut buf = Vec::new();
    let mut total = 0;
    for i in 0..cells as u32 {
        buf.clear();
        index.query_candidates(CellIndex(i), &mut buf);
        total += buf.len();
    }
    total
}

fn bench_query_grid_vs_brute(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_all");
    for count in [500usize, 2000] {
        let reg = registry(scattered_profile(count, 42));
        let grid = SpatialGrid::build(reg.positions(), 1.5).unwrap();
        let brute = BruteForceIndex::new(reg.len());
        group.bench_with_input(BenchmarkId::new("grid", count), &grid, |b, g| {
            b.iter(|| black_box(query_all(g, count)));
        });
        group.bench_with_input(BenchmarkId::new("brute_force", count), &brute, |b, g| {
            b.iter(|| black_box(query_all(g, count)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grid_build, bench_query_grid_vs_brute);
criterion_main!(benches);
