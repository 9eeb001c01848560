//! Meridian storage codec layer.
//!
//! The pieces of the storage engine's type system that other subsystems
//! depend on for binary compatibility:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`buffer`]    | `WriteBuffer` / `ReadBuffer`, base-128 varint + varlong |
//! | [`codec`]     | The [`DataCodec`] trait and the opaque-bytes codec |
//! | [`versioned`] | MVCC `(tid, value)` pairs and their batch-aware codec |
//! | [`error`]     | `CodecError` |
//!
//! The cluster layer reuses these buffers for its gossip packets, and MVCC
//! cell contents carried inside gossip application state are encoded with
//! [`VersionedValueCodec`], so both sides of the wire agree on one layout.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod versioned;

pub use {
    buffer::{ReadBuffer, WriteBuffer},
    codec::{BytesCodec, DataCodec},
    error::CodecError,
    versioned::{VersionedValue, VersionedValueCodec},
};
