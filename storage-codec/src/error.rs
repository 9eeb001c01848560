//! Error types for the storage codec layer.

use thiserror::Error;

/// Errors raised while encoding or decoding wire data.
///
/// Decoders never partially apply: a `Corrupt` result means the caller must
/// discard the whole frame.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The byte stream is malformed: short read, unknown tag, or an
    /// overlong variable-length integer.
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// The frame was produced by a protocol line this reader cannot decode.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),
}

impl CodecError {
    /// Shorthand for building a `Corrupt` error from any message.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        CodecError::Corrupt(msg.into())
    }
}

/// Convenience result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
