//! Binary compatibility between the MVCC codec and gossip transport.
//!
//! Versioned-value batches are produced by the storage engine and carried
//! opaquely inside gossip application state; the far side must decode the
//! exact bytes the origin encoded.

use {
    crate::harness::{exchange, SimNode},
    meridian_gossip::state::StateKey,
    meridian_storage_codec::{
        buffer::{ReadBuffer, WriteBuffer},
        codec::BytesCodec,
        versioned::{VersionedValue, VersionedValueCodec},
    },
};

fn codec() -> VersionedValueCodec<BytesCodec> {
    VersionedValueCodec::new(BytesCodec)
}

#[test]
fn test_fast_path_batch_survives_gossip() {
    // S5: all-committed batch, tag 0x00 on the wire
    let batch = vec![
        VersionedValue::committed(b"x1".to_vec()),
        VersionedValue::committed(b"x2".to_vec()),
    ];
    let mut buf = WriteBuffer::new();
    codec().write_batch(&mut buf, &batch);
    let encoded = buf.into_bytes();
    assert_eq!(encoded[0], 0x00);

    let mut origin = SimNode::new(1);
    let mut peer = SimNode::new(1);
    origin.set(StateKey::Schema, &encoded);
    exchange(&mut origin, &mut peer);

    let carried = peer
        .value_of(&origin.id, StateKey::Schema)
        .expect("cell gossiped");
    assert_eq!(carried, encoded);

    let mut rd = ReadBuffer::new(&carried);
    assert_eq!(codec().read_batch(&mut rd, batch.len()).unwrap(), batch);
}

#[test]
fn test_slow_path_batch_survives_gossip() {
    // S6: a null value and a pending tid force tag 0x01
    let batch = vec![
        VersionedValue::pending(0, None),
        VersionedValue::pending(5, Some(b"x".to_vec())),
    ];
    let mut buf = WriteBuffer::new();
    codec().write_batch(&mut buf, &batch);
    let encoded = buf.into_bytes();
    assert_eq!(encoded[0], 0x01);

    let mut origin = SimNode::new(1);
    let mut peer = SimNode::new(1);
    origin.set(StateKey::Schema, &encoded);
    exchange(&mut origin, &mut peer);

    let carried = peer
        .value_of(&origin.id, StateKey::Schema)
        .expect("cell gossiped");
    let mut rd = ReadBuffer::new(&carried);
    let decoded = codec().read_batch(&mut rd, batch.len()).unwrap();
    assert_eq!(decoded, batch);
    assert!(decoded[0].value.is_none());
}

#[test]
fn test_reencoded_delta_is_byte_identical() {
    // two hops: origin → relay → peer; the bytes must never drift
    let batch = vec![
        VersionedValue::pending(-2, Some(b"undo".to_vec())),
        VersionedValue::committed(b"keep".to_vec()),
    ];
    let mut buf = WriteBuffer::new();
    codec().write_batch(&mut buf, &batch);
    let encoded = buf.into_bytes();

    let mut origin = SimNode::new(1);
    let mut relay = SimNode::new(1);
    let mut peer = SimNode::new(1);
    origin.set(StateKey::Schema, &encoded);

    exchange(&mut origin, &mut relay);
    exchange(&mut relay, &mut peer);

    assert_eq!(peer.value_of(&origin.id, StateKey::Schema), Some(encoded));
}
