//! Gossip digests: the per-node reconciliation summary.

use {
    crate::{node::NodeId, table::EndpointStateTable},
    rand::{seq::SliceRandom, Rng},
    std::fmt,
};

/// `(node, generation, max version)` summary of one node's state.
///
/// Immutable once constructed; lives only inside gossip messages.  A
/// digest with `max_version == 0` doubles as a request for the node's
/// full state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GossipDigest {
    /// The summarised node.
    pub node: NodeId,
    /// The node's incarnation as known to the sender.
    pub generation: u64,
    /// Greatest version across the node's heartbeat and cells.
    pub max_version: u64,
}

impl GossipDigest {
    /// Build a digest.
    pub fn new(node: NodeId, generation: u64, max_version: u64) -> Self {
        Self {
            node,
            generation,
            max_version,
        }
    }
}

impl fmt::Display for GossipDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.node, self.generation, self.max_version)
    }
}

/// One digest per known node, shuffled so the receiving peer cannot infer
/// the local table's iteration order.
pub fn digest_list<R: Rng + ?Sized>(
    table: &EndpointStateTable,
    rng: &mut R,
) -> Vec<GossipDigest> {
    let mut digests: Vec<GossipDigest> = table
        .iter()
        .map(|(id, state)| {
            GossipDigest::new(*id, state.heartbeat.generation, state.max_version())
        })
        .collect();
    digests.shuffle(rng);
    digests
}

// ── Tests ───────────────────────────────────────────────────────────────────
