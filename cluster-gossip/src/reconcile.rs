//! Digest reconciliation: deciding what to send and what to request.
//!
//! Pure function of the local table and a remote digest list.  Both the
//! SYN handler (building an ACK) and convergence tests call straight into
//! it; no I/O or mutation happens here.

use {
    crate::{
        digest::GossipDigest,
        node::NodeId,
        state::NodeState,
        table::EndpointStateTable,
    },
    std::collections::HashSet,
};

/// Result of reconciling a remote digest list against the local table.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Digests to send back as requests.  `max_version == 0` asks for the
    /// node's full state; anything else is the floor above which deltas
    /// are wanted.
    pub requests: Vec<GossipDigest>,
    /// Node states (full or fragment) to offer to the peer.
    pub deltas: Vec<(NodeId, NodeState)>,
}

impl Reconciliation {
    /// Whether both sides are already in sync.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.deltas.is_empty()
    }
}

/// Partition each remote digest against the local table.
///
/// Per digest, exactly one of five things happens: the remote incarnation
/// is newer (request everything), the local incarnation is newer (offer
/// everything), same incarnation but the local view is ahead (offer the
/// fragments above the peer's max version), behind (request above the
/// local max version), or identical (silence).  Nodes known locally but
/// absent from the digest list are offered in full.
pub fn reconcile(table: &EndpointStateTable, remote: &[GossipDigest]) -> Reconciliation {
    let mut out = Reconciliation::default();
    let mut mentioned: HashSet<NodeId> = HashSet::with_capacity(remote.len());

    for digest in remote {
        mentioned.insert(digest.node);
        let Some(local) = table.get(&digest.node) else {
            out.requests
                .push(GossipDigest::new(digest.node, digest.generation, 0));
            continue;
        };
        let local_generation = local.heartbeat.generation;
        let local_max = local.max_version();

        if local_generation < digest.generation {
            out.requests
                .push(GossipDigest::new(digest.node, digest.generation, 0));
        } else if local_generation > digest.generation {
            out.deltas.push((digest.node, local.clone()));
        } else if local_max > digest.max_version {
            if let Some(fragment) = table.state_above(&digest.node, digest.max_version) {
                out.deltas.push((digest.node, fragment));
            }
        } else if local_max < digest.max_version {
            out.requests
                .push(GossipDigest::new(digest.node, local_generation, local_max));
        }
    }

    for (node, state) in table.iter() {
        if !mentioned.contains(node) {
            out.deltas.push((*node, state.clone()));
        }
    }
    out
}

/// Answer request digests out of the local table.
///
/// A request whose generation matches locally is answered with the
/// fragments above its floor (`max_version == 0` therefore yields the
/// full state); a request for an older generation gets the whole current
/// incarnation; a request for a generation newer than anything local is
/// skipped, since there is nothing to offer.
pub fn fulfill(
    table: &EndpointStateTable,
    requests: &[GossipDigest],
) -> Vec<(NodeId, NodeState)> {
    let mut states = Vec::with_capacity(requests.len());
    for request in requests {
        let Some(local) = table.get(&request.node) else {
            continue;
        };
        if local.heartbeat.generation > request.generation {
            states.push((request.node, local.clone()));
        } else if local.heartbeat.generation == request.generation {
            if let Some(fragment) = table.state_above(&request.node, request.max_version) {
                states.push((request.node, fragment));
            }
        }
    }
    states
}

// ── Tests ───────────────────────────────────────────────────────────────────
