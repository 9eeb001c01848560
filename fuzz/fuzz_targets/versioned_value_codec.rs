//! Fuzz the versioned-value codec with random bytes and random batches.
//!
//! Goals:
//! - Decoding arbitrary input never panics; it either yields values or a
//!   clean `CodecError`.
//! - Every encodable batch round-trips exactly.
//! - The comparator stays antisymmetric under arbitrary inputs.

#![no_main]

use {
    arbitrary::Arbitrary,
    libfuzzer_sys::fuzz_target,
    meridian_storage_codec::{
        buffer::{ReadBuffer, WriteBuffer},
        codec::BytesCodec,
        versioned::{VersionedValue, VersionedValueCodec},
    },
};

/// Cap on fuzz-driven batch lengths, so a four-byte input cannot request
/// a multi-gigabyte decode loop.
const MAX_BATCH: usize = 64;

#[derive(Debug, Arbitrary)]
struct FuzzValue {
    tid: i64,
    value: Option<Vec<u8>>,
}

impl FuzzValue {
    fn into_value(self) -> VersionedValue<Vec<u8>> {
        VersionedValue {
            tid: self.tid,
            value: self.value,
        }
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzCase {
    /// Feed raw bytes to the batch decoder.
    Decode { bytes: Vec<u8>, len: u8 },
    /// Encode a real batch and decode it back.
    Roundtrip { values: Vec<FuzzValue> },
    /// Probe the comparator.
    Compare { a: FuzzValue, b: FuzzValue },
}

fuzz_target!(|case: FuzzCase| {
    let codec = VersionedValueCodec::new(BytesCodec);
    match case {
        FuzzCase::Decode { bytes, len } => {
            let mut rd = ReadBuffer::new(&bytes);
            let _ = codec.read_batch(&mut rd, usize::from(len) % MAX_BATCH);
        }
        FuzzCase::Roundtrip { values } => {
            let values: Vec<VersionedValue<Vec<u8>>> = values
                .into_iter()
                .take(MAX_BATCH)
                .map(FuzzValue::into_value)
                .collect();
            let mut buf = WriteBuffer::new();
            codec.write_batch(&mut buf, &values);
            let mut rd = ReadBuffer::new(buf.as_slice());
            let decoded = codec
                .read_batch(&mut rd, values.len())
                .expect("own encoding decodes");
            assert_eq!(decoded, values);
            assert_eq!(rd.remaining(), 0);
        }
        FuzzCase::Compare { a, b } => {
            let a = a.into_value();
            let b = b.into_value();
            assert_eq!(codec.compare(&a, &b), codec.compare(&b, &a).reverse());
            assert_eq!(codec.compare(&a, &a), std::cmp::Ordering::Equal);
        }
    }
});
