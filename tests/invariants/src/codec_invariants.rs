//! Versioned-value codec properties.

use {
    meridian_storage_codec::{
        buffer::{ReadBuffer, WriteBuffer},
        codec::BytesCodec,
        versioned::{VersionedValue, VersionedValueCodec},
    },
    proptest::prelude::*,
    std::cmp::Ordering,
};

fn codec() -> VersionedValueCodec<BytesCodec> {
    VersionedValueCodec::new(BytesCodec)
}

fn value_strategy() -> impl Strategy<Value = VersionedValue<Vec<u8>>> {
    (
        any::<i64>(),
        proptest::option::of(proptest::collection::vec(any::<u8>(), 0..32)),
    )
        .prop_map(|(tid, value)| VersionedValue { tid, value })
}

fn committed_strategy() -> impl Strategy<Value = VersionedValue<Vec<u8>>> {
    proptest::collection::vec(any::<u8>(), 0..32)
        .prop_map(VersionedValue::committed)
}

proptest! {
    // P4: decode(encode(x)) == x for arbitrary batches
    #[test]
    fn prop_batch_roundtrip(values in proptest::collection::vec(value_strategy(), 0..16)) {
        let mut buf = WriteBuffer::new();
        codec().write_batch(&mut buf, &values);
        let mut rd = ReadBuffer::new(buf.as_slice());
        let decoded = codec().read_batch(&mut rd, values.len()).unwrap();
        prop_assert_eq!(decoded, values);
        prop_assert_eq!(rd.remaining(), 0);
    }

    #[test]
    fn prop_single_roundtrip(value in value_strategy()) {
        let mut buf = WriteBuffer::new();
        codec().write(&mut buf, &value);
        let mut rd = ReadBuffer::new(buf.as_slice());
        prop_assert_eq!(codec().read(&mut rd).unwrap(), value);
    }

    // P5: an all-committed batch decodes identically through either path
    #[test]
    fn prop_fast_and_slow_paths_agree(values in proptest::collection::vec(committed_strategy(), 0..16)) {
        let mut fast = WriteBuffer::new();
        codec().write_batch(&mut fast, &values);
        prop_assert_eq!(fast.as_slice()[0], 0x00);

        // hand-build the slow-path framing for the same values
        let mut slow = WriteBuffer::new();
        slow.put_u8(1);
        for value in &values {
            codec().write(&mut slow, value);
        }

        let mut fast_rd = ReadBuffer::new(fast.as_slice());
        let mut slow_rd = ReadBuffer::new(slow.as_slice());
        let from_fast = codec().read_batch(&mut fast_rd, values.len()).unwrap();
        let from_slow = codec().read_batch(&mut slow_rd, values.len()).unwrap();
        prop_assert_eq!(&from_fast, &from_slow);
        prop_assert_eq!(from_fast, values);
    }

    #[test]
    fn prop_comparator_is_total_order(
        a in value_strategy(),
        b in value_strategy(),
        c in value_strategy(),
    ) {
        let codec = codec();
        // reflexivity
        prop_assert_eq!(codec.compare(&a, &a), Ordering::Equal);
        // antisymmetry
        prop_assert_eq!(codec.compare(&a, &b), codec.compare(&b, &a).reverse());
        // transitivity
        if codec.compare(&a, &b) != Ordering::Greater
            && codec.compare(&b, &c) != Ordering::Greater
        {
            prop_assert_ne!(codec.compare(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn prop_varlong_roundtrip(value in any::<i64>()) {
        let mut buf = WriteBuffer::new();
        buf.put_varlong(value);
        let mut rd = ReadBuffer::new(buf.as_slice());
        prop_assert_eq!(rd.get_varlong().unwrap(), value);
        prop_assert_eq!(rd.remaining(), 0);
    }

    // decoding arbitrary garbage must fail cleanly, never panic
    #[test]
    fn prop_garbage_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64), len in 0usize..8) {
        let mut rd = ReadBuffer::new(&bytes);
        let _ = codec().read_batch(&mut rd, len);
    }
}
