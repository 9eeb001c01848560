//! Error types for the membership engine.

use {crate::node::NodeId, thiserror::Error};

/// Errors raised by membership-table operations.
#[derive(Error, Debug)]
pub enum GossipError {
    /// A local-writer operation was attempted against a remote node's
    /// state.  The mutation is rejected before anything is applied.
    #[error("node {0} is not the local node")]
    NotLocalNode(NodeId),
}

/// Convenience result type for membership operations.
pub type Result<T> = std::result::Result<T, GossipError>;
