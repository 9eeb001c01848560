//! Node identity.

use std::fmt;

/// Number of identity bytes.
pub const NODE_ID_LEN: usize = 16;

/// Opaque, stable identity of one cluster member.
///
/// Assigned once per process lifetime and used as the key of every
/// membership table and gossip message.  Ordering and hashing are total so
/// the id can key maps and be sorted into deterministic snapshots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId([u8; NODE_ID_LEN]);

impl NodeId {
    /// Wrap raw identity bytes.
    pub const fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the identity bytes for serialization.
    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// Rebuild an id from serialized bytes.
    pub fn from_bytes(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// A fresh random identity, for process boot and tests.
    pub fn random() -> Self {
        let mut bytes = [0u8; NODE_ID_LEN];
        rand::Rng::fill(&mut rand::rng(), &mut bytes[..]);
        Self(bytes)
    }
}

/// Identity bytes shown by `Display`; log lines get a short, Git-style
/// prefix rather than all 32 hex characters.
const DISPLAY_BYTES: usize = 4;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..DISPLAY_BYTES] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
