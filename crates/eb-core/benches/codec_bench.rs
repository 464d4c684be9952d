//! Benchmarks for the connectivity/geometry encode-decode pipeline on
//! planar grid meshes of increasing size.
//!
//! All benchmarks share the same workload shape (an `n x n` triangulated
//! grid patch), scaled by `n` so the cost of traversal, arithmetic coding
//! and container framing can be compared across mesh sizes.

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use eb_core::container::{read_eb_file, write_eb_file};
use eb_core::decoder::decode;
use eb_core::encoder::encode_mesh;
use eb_core::{CompressionOptions, MeshData};

fn grid_patch(n: usize) -> MeshData {
    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            points.push([i as f64, j as f64, 0.0]);
        }
    }
    let idx = |i: usize, j: usize| -> u32 { (i * n + j) as u32 };
    let mut faces = Vec::new();
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    MeshData::new(points, faces)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_encode");
    for n in [8usize, 16, 32] {
        let mesh = grid_patch(n);
        let opts = CompressionOptions::uniform(0.01, 16).unwrap();
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(encode_mesh(&mesh, opts).unwrap()));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_decode");
    for n in [8usize, 16, 32] {
        let mesh = grid_patch(n);
        let opts = CompressionOptions::uniform(0.01, 16).unwrap();
        let encoded = encode_mesh(&mesh, opts).unwrap();
        let mut buf = Vec::new();
        write_eb_file(&mut buf, &encoded).unwrap();

        group.throughput(Throughput::Elements(mesh.faces.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut cursor = Cursor::new(&buf);
                let container = read_eb_file(&mut cursor).unwrap();
                black_box(decode(&container).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_round_trip");
    for n in [8usize, 16, 32] {
        let mesh = grid_patch(n);
        let opts = CompressionOptions::uniform(0.01, 16).unwrap();
        group.throughput(Throughput::Elements(mesh.faces.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let encoded = encode_mesh(&mesh, opts).unwrap();
                let mut buf = Vec::new();
                write_eb_file(&mut buf, &encoded).unwrap();
                let mut cursor = Cursor::new(&buf);
                let container = read_eb_file(&mut cursor).unwrap();
                black_box(decode(&container).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip);
criterion_main!(benches);
