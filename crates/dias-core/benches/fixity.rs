//! Benchmarks for fixity throughput.
//!
//! Measures streamed hashing at several chunk sizes and the cost of
//! re-reading a package archive for validation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use dias_core::CancellationToken;
use dias_core::NoopProgress;
use dias_core::copy::CopyBuffer;
use dias_core::copy::sha256_reader;
use dias_core::creation::archive_tree;
use dias_core::inspection::scan_archive;
use std::fs;
use std::hint::black_box;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

const PAYLOAD_SIZE: usize = 8 * 1024 * 1024;

/// Creates `<temp>/pkg` with `file_count` files of `file_size` bytes.
fn create_package_tree(temp: &TempDir, file_count: usize, file_size: usize) -> PathBuf {
    let root = temp.path().join("pkg");
    let content = root.join("content");
    fs::create_dir_all(&content).unwrap();
    let data = vec![0x5a_u8; file_size];
    for i in 0..file_count {
        fs::write(content.join(format!("file_{i:05}.bin")), &data).unwrap();
    }
    root
}

fn bench_hash_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sha256_chunk_size");
    let data = vec![0xa5_u8; PAYLOAD_SIZE];
    group.throughput(Throughput::Bytes(PAYLOAD_SIZE as u64));

    for chunk in [4 * 1024, 64 * 1024, 1024 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            let mut buffer = CopyBuffer::with_size(chunk);
            b.iter(|| {
                let digest = sha256_reader(&mut Cursor::new(&data), &mut buffer).unwrap();
                black_box(digest);
            });
        });
    }
    group.finish();
}

fn bench_archive_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_scan");

    for (files, size) in [(1000, 1024), (16, 512 * 1024)] {
        let temp = TempDir::new().unwrap();
        let root = create_package_tree(&temp, files, size);
        let tar_path = temp.path().join("pkg.tar");
        archive_tree(
            &root,
            &tar_path,
            "content",
            &CancellationToken::new(),
            &mut NoopProgress,
        )
        .unwrap();

        group.throughput(Throughput::Bytes((files * size) as u64));
        for hash in [false, true] {
            let id = BenchmarkId::new(if hash { "hashed" } else { "listed" }, files);
            group.bench_with_input(id, &hash, |b, &hash| {
                b.iter(|| black_box(scan_archive(&tar_path, hash).unwrap()));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_hash_chunk_sizes, bench_archive_scan);
criterion_main!(benches);
