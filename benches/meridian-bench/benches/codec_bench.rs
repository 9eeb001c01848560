//! Versioned-value codec benchmarks: batch encode/decode on both paths.

use {
    criterion::{criterion_group, criterion_main, BatchSize, Criterion},
    meridian_bench::{committed_batch, mixed_batch},
    meridian_storage_codec::{
        buffer::{ReadBuffer, WriteBuffer},
        codec::BytesCodec,
        versioned::VersionedValueCodec,
    },
};

const BATCH: usize = 1_024;

fn bench_encode(c: &mut Criterion) {
    let codec = VersionedValueCodec::new(BytesCodec);
    let fast = committed_batch(BATCH);
    let slow = mixed_batch(BATCH);

    c.bench_function("codec/encode/fast_path_1k", |b| {
        b.iter(|| {
            let mut buf = WriteBuffer::with_capacity(BATCH * 20);
            codec.write_batch(&mut buf, &fast);
            buf.into_bytes()
        })
    });

    c.bench_function("codec/encode/slow_path_1k", |b| {
        b.iter(|| {
            let mut buf = WriteBuffer::with_capacity(BATCH * 24);
            codec.write_batch(&mut buf, &slow);
            buf.into_bytes()
        })
    });
}

fn bench_decode(c: &mut Criterion) {
    let codec = VersionedValueCodec::new(BytesCodec);

    let mut fast_buf = WriteBuffer::new();
    codec.write_batch(&mut fast_buf, &committed_batch(BATCH));
    let fast_bytes = fast_buf.into_bytes();

    let mut slow_buf = WriteBuffer::new();
    codec.write_batch(&mut slow_buf, &mixed_batch(BATCH));
    let slow_bytes = slow_buf.into_bytes();

    c.bench_function("codec/decode/fast_path_1k", |b| {
        b.iter_batched(
            || ReadBuffer::new(&fast_bytes),
            |mut rd| codec.read_batch(&mut rd, BATCH).unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("codec/decode/slow_path_1k", |b| {
        b.iter_batched(
            || ReadBuffer::new(&slow_bytes),
            |mut rd| codec.read_batch(&mut rd, BATCH).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
