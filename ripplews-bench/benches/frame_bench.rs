//! Frame encoding/decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ripplews_protocol::frame::{apply_mask, Frame};
use std::io::Cursor;

const KEY: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for size in [100usize, 1000, 65536] {
        let frame = Frame::text(vec![0x41u8; size]);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| black_box(frame.encode(KEY)));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for size in [100usize, 1000, 65536] {
        let encoded = Frame::text(vec![0x41u8; size]).encode(KEY);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut cursor = Cursor::new(&encoded[..]);
                black_box(Frame::read_from(&mut cursor).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");

    let size = 64 * 1024;
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("apply_mask_64k", |b| {
        let mut data = vec![0x41u8; size];
        b.iter(|| black_box(apply_mask(&mut data, KEY, 0)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_masking
);
criterion_main!(benches);
