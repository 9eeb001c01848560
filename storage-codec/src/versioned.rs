//! The MVCC versioned-value codec.
//!
//! A versioned value is a `(tid, value)` pair: `tid` names the transaction
//! that wrote the value, with `0` meaning the write is committed and no
//! transaction is pending.  Whole column batches of these pairs travel
//! through the storage engine and, byte for byte, through gossip-delivered
//! application state, so the layout here governs rolling upgrades and must
//! never drift.
//!
//! ## Wire layout
//!
//! Batch form, chosen by a single scan over the values:
//!
//! ```text
//! fast path (all tid == 0, all values present):
//!   [0x00] [inner encoding] × len
//! slow path:
//!   [0x01] [single form] × len
//! ```
//!
//! Single form: `varlong(tid)`, presence byte (`0` absent / `1` present),
//! then the inner codec's encoding when present.

use {
    crate::{
        buffer::{ReadBuffer, WriteBuffer},
        codec::DataCodec,
        error::{CodecError, Result},
    },
    std::cmp::Ordering,
};

/// Batch tag: every tid is zero and every value present.
const TAG_FAST: u8 = 0;
/// Batch tag: per-value single forms follow.
const TAG_SLOW: u8 = 1;

/// Fixed per-value overhead charged on top of the inner value's footprint.
const TID_MEMORY: usize = 8;

/// A value stamped with the transaction that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue<V> {
    /// Writing transaction id; `0` means committed.
    pub tid: i64,
    /// The value itself; `None` marks a pending delete.
    pub value: Option<V>,
}

impl<V> VersionedValue<V> {
    /// A committed value with no pending transaction.
    pub fn committed(value: V) -> Self {
        Self {
            tid: 0,
            value: Some(value),
        }
    }

    /// A value written by transaction `tid`.
    pub fn pending(tid: i64, value: Option<V>) -> Self {
        Self { tid, value }
    }

    /// Whether this entry is visible outside its writing transaction.
    pub fn is_committed(&self) -> bool {
        self.tid == 0
    }
}

/// Batch-aware codec for [`VersionedValue`], parameterised over the codec
/// of the inner value type.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionedValueCodec<C> {
    value_codec: C,
}

impl<C: DataCodec> VersionedValueCodec<C> {
    /// Wrap an inner value codec.
    pub fn new(value_codec: C) -> Self {
        Self { value_codec }
    }

    /// Encode a homogeneous batch.
    ///
    /// One scan decides the path: when every tid is zero and every value is
    /// present, a single `0` tag byte replaces all per-value framing.
    pub fn write_batch(&self, buf: &mut WriteBuffer, values: &[VersionedValue<C::Value>]) {
        let fast_path = values.iter().all(|v| v.tid == 0 && v.value.is_some());
        if fast_path {
            buf.put_u8(TAG_FAST);
            for v in values {
                if let Some(value) = &v.value {
                    self.value_codec.write(buf, value);
                }
            }
        } else {
            buf.put_u8(TAG_SLOW);
            for v in values {
                self.write(buf, v);
            }
        }
    }

    /// Decode a batch of `len` values written by [`write_batch`].
    ///
    /// [`write_batch`]: VersionedValueCodec::write_batch
    pub fn read_batch(
        &self,
        buf: &mut ReadBuffer<'_>,
        len: usize,
    ) -> Result<Vec<VersionedValue<C::Value>>> {
        let mut values = Vec::with_capacity(len);
        match buf.get_u8()? {
            TAG_FAST => {
                for _ in 0..len {
                    values.push(VersionedValue::committed(self.value_codec.read(buf)?));
                }
            }
            TAG_SLOW => {
                for _ in 0..len {
                    values.push(self.read(buf)?);
                }
            }
            tag => {
                return Err(CodecError::corrupt(format!(
                    "unknown versioned-value batch tag {tag}"
                )))
            }
        }
        Ok(values)
    }

    /// Encode one value in single form.
    pub fn write(&self, buf: &mut WriteBuffer, v: &VersionedValue<C::Value>) {
        buf.put_varlong(v.tid);
        match &v.value {
            None => buf.put_u8(0),
            Some(value) => {
                buf.put_u8(1);
                self.value_codec.write(buf, value);
            }
        }
    }

    /// Decode one value in single form.
    pub fn read(&self, buf: &mut ReadBuffer<'_>) -> Result<VersionedValue<C::Value>> {
        let tid = buf.get_varlong()?;
        let value = match buf.get_u8()? {
            0 => None,
            1 => Some(self.value_codec.read(buf)?),
            byte => {
                return Err(CodecError::corrupt(format!(
                    "invalid presence byte {byte}"
                )))
            }
        };
        Ok(VersionedValue { tid, value })
    }

    /// Total order: by signed tid, then by the inner comparator, with an
    /// absent value ordering before any present one.
    pub fn compare(
        &self,
        a: &VersionedValue<C::Value>,
        b: &VersionedValue<C::Value>,
    ) -> Ordering {
        a.tid.cmp(&b.tid).then_with(|| match (&a.value, &b.value) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => self.value_codec.compare(x, y),
        })
    }

    /// Cache footprint: the inner value's footprint plus the tid word.
    pub fn memory(&self, v: &VersionedValue<C::Value>) -> usize {
        TID_MEMORY
            + v.value
                .as_ref()
                .map_or(0, |value| self.value_codec.memory(value))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
