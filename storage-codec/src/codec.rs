//! The value-codec abstraction shared by the storage engine and the
//! gossip wire formats.
//!
//! Codecs are plain values passed explicitly to every encode/decode call,
//! so tests can substitute their own without touching global state.

use {
    crate::{
        buffer::{ReadBuffer, WriteBuffer},
        error::Result,
    },
    std::cmp::Ordering,
};

/// Serialization, ordering, and memory accounting for one value type.
pub trait DataCodec {
    /// The in-memory value this codec handles.
    type Value;

    /// Append the encoded form of `value` to `buf`.
    fn write(&self, buf: &mut WriteBuffer, value: &Self::Value);

    /// Decode one value from the current read position.
    fn read(&self, buf: &mut ReadBuffer<'_>) -> Result<Self::Value>;

    /// Total order over values. Must agree with encoded-form equality.
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering;

    /// Approximate heap footprint of `value`, used for cache accounting.
    fn memory(&self, value: &Self::Value) -> usize;
}

/// Codec for opaque byte strings, length-prefixed on the wire and ordered
/// lexicographically.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesCodec;

impl DataCodec for BytesCodec {
    type Value = Vec<u8>;

    fn write(&self, buf: &mut WriteBuffer, value: &Self::Value) {
        buf.put_len_bytes(value);
    }

    fn read(&self, buf: &mut ReadBuffer<'_>) -> Result<Self::Value> {
        Ok(buf.get_len_bytes()?.to_vec())
    }

    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering {
        a.cmp(b)
    }

    fn memory(&self, value: &Self::Value) -> usize {
        value.len()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
