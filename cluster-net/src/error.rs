//! Error types for the cluster networking layer.

use {
    meridian_gossip::{error::GossipError, node::NodeId},
    meridian_storage_codec::error::CodecError,
    thiserror::Error,
};

/// Errors surfaced by the transport seam.
///
/// Gossip is best-effort datagram traffic: a send failure is logged and
/// counted, never used to demote the peer.  Missing heartbeats are the
/// failure detector's signal.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No route to the peer.
    #[error("peer {0} unreachable")]
    Unreachable(NodeId),

    /// Underlying I/O failure.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the cluster networking layer.
#[derive(Error, Debug)]
pub enum ClusterNetError {
    /// A frame failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A packet could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The membership engine rejected an operation.
    #[error("gossip error: {0}")]
    Gossip(#[from] GossipError),

    /// The gossip executor has stopped and its mailbox is gone.
    #[error("gossip executor mailbox is closed")]
    MailboxClosed,

    /// The executor thread could not be spawned.
    #[error("failed to spawn gossip executor: {0}")]
    Spawn(std::io::Error),
}

/// Convenience result type for cluster networking operations.
pub type Result<T> = std::result::Result<T, ClusterNetError>;
