//! Benchmarks for the spatial grid.
//!
//! Measures performance of:
//! - Coordinate to cell mapping
//! - Ancestor derivation
//! - Covering enumeration at viewport sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pulsemap_grid::{covering_cells, covering_size, BoundingBox, CellId};

fn bench_cell_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_at");
    for &res in &[4u8, 8, 12, 15] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(res), &res, |b, &res| {
            b.iter(|| CellId::at(black_box(39.95), black_box(-75.16), res))
        });
    }
    group.finish();
}

fn bench_ancestor(c: &mut Criterion) {
    let cell = CellId::at(39.95, -75.16, 15).unwrap();
    c.bench_function("ancestor_at_4", |b| {
        b.iter(|| black_box(cell).ancestor_at(black_box(4)))
    });
}

fn bench_covering(c: &mut Criterion) {
    let mut group = c.benchmark_group("covering");

    // A city-scale viewport (roughly 1x1 degrees)
    let bbox = BoundingBox::new(-75.0, 39.0, -74.0, 40.0).unwrap();

    for &res in &[4u8, 6, 8, 10] {
        let size = covering_size(&bbox, res).unwrap();
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(res), &res, |b, &res| {
            b.iter(|| covering_cells(black_box(&bbox), res))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cell_at, bench_ancestor, bench_covering);
criterion_main!(benches);
