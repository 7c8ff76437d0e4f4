#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use parmat::{
    read_matrix_market_triplet, write_matrix_market_triplet, Header, ReadOptions, WriteOptions,
};

// --- SETUP ---

fn synthesize(nnz: usize, dim: u64) -> (Vec<u64>, Vec<u64>, Vec<f64>, String) {
    let mut state = 0x5eed_u64;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let mut rows = Vec::with_capacity(nnz);
    let mut cols = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for _ in 0..nnz {
        rows.push(next() % dim);
        cols.push(next() % dim);
        values.push((next() as f64) / 1e6);
    }

    let mut text = Vec::new();
    write_matrix_market_triplet(
        &mut text,
        Header::coordinate(dim, dim, 0),
        &rows,
        &cols,
        &values,
        &WriteOptions::default(),
    )
    .unwrap();
    (rows, cols, values, String::from_utf8(text).unwrap())
}

// --- BENCHES ---

fn bench_read(c: &mut Criterion) {
    let (_, _, _, text) = synthesize(1_000_000, 100_000);

    let mut group = c.benchmark_group("read_coordinate");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.sample_size(10);

    group.bench_function("sequential", |b| {
        let options = ReadOptions::default().num_threads(1);
        b.iter(|| {
            read_matrix_market_triplet::<_, f64>(&mut black_box(text.as_bytes()), &options).unwrap()
        });
    });
    group.bench_function("parallel", |b| {
        let options = ReadOptions::default();
        b.iter(|| {
            read_matrix_market_triplet::<_, f64>(&mut black_box(text.as_bytes()), &options).unwrap()
        });
    });
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let (rows, cols, values, text) = synthesize(1_000_000, 100_000);

    let mut group = c.benchmark_group("write_coordinate");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.sample_size(10);

    group.bench_function("sequential", |b| {
        let options = WriteOptions::default().num_threads(1);
        b.iter(|| {
            let mut out = Vec::with_capacity(text.len());
            write_matrix_market_triplet(
                &mut out,
                Header::coordinate(100_000, 100_000, 0),
                black_box(&rows),
                black_box(&cols),
                black_box(&values),
                &options,
            )
            .unwrap();
            out
        });
    });
    group.bench_function("parallel", |b| {
        let options = WriteOptions::default();
        b.iter(|| {
            let mut out = Vec::with_capacity(text.len());
            write_matrix_market_triplet(
                &mut out,
                Header::coordinate(100_000, 100_000, 0),
                black_box(&rows),
                black_box(&cols),
                black_box(&values),
                &options,
            )
            .unwrap();
            out
        });
    });
    group.finish();
}

criterion_group!(benches, bench_read, bench_write);
criterion_main!(benches);
