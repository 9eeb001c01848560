//! Meridian Test Harness
//!
//! Provides a lightweight environment for integration-testing the cluster
//! membership engine without sockets or threads:
//!
//! - [`SimNode`] — one node's endpoint state table plus write helpers.
//! - [`exchange`] — a full SYN → ACK → ACK2 round between two nodes,
//!   with every message actually encoded to wire bytes and decoded on
//!   the far side.
//! - [`SimCluster`] — N nodes under random pairwise gossip, for
//!   convergence scenarios.
//!
//! The harness does NOT spin up gossip executors; the threaded path is
//! exercised separately against the loopback hub.

use {
    meridian_cluster_net::packet::{
        Ack2Packet, AckPacket, GossipPacket, SynPacket, PROTOCOL_VERSION,
    },
    meridian_gossip::{
        digest::digest_list,
        node::NodeId,
        reconcile::{fulfill, reconcile},
        state::{Heartbeat, StateKey},
        table::EndpointStateTable,
    },
    rand::Rng,
    std::time::Instant,
};

/// Default node count for convergence scenarios.
pub const DEFAULT_CLUSTER_SIZE: usize = 8;

/// Generation used by harness nodes unless a scenario restarts one.
pub const DEFAULT_GENERATION: u64 = 1;

// ─── Sim node ────────────────────────────────────────────────────────────────

/// One simulated cluster member.
pub struct SimNode {
    /// The node's identity.
    pub id: NodeId,
    /// The node's authoritative table.
    pub table: EndpointStateTable,
}

impl SimNode {
    /// A fresh node at the given generation.
    pub fn new(generation: u64) -> Self {
        Self::with_id(NodeId::random(), generation)
    }

    /// A node with a fixed identity, for restart scenarios.
    pub fn with_id(id: NodeId, generation: u64) -> Self {
        Self {
            id,
            table: EndpointStateTable::new(id, generation, Instant::now()),
        }
    }

    /// Write one local cell, returning the version it landed at.
    pub fn set(&mut self, key: StateKey, value: &[u8]) -> u64 {
        self.table
            .bump_local(&self.id, key, value.to_vec())
            .expect("local write")
    }

    /// Advance the local heartbeat as a period tick would.
    pub fn tick_heartbeat(&mut self) -> u64 {
        self.table.bump_heartbeat()
    }

    /// The heartbeat this node holds for `node`.
    pub fn heartbeat_of(&self, node: &NodeId) -> Option<Heartbeat> {
        self.table.get(node).map(|state| state.heartbeat)
    }

    /// The max version this node holds for `node`.
    pub fn max_version_of(&self, node: &NodeId) -> Option<u64> {
        self.table.get(node).map(|state| state.max_version())
    }

    /// The value bytes this node holds for `(node, key)`.
    pub fn value_of(&self, node: &NodeId, key: StateKey) -> Option<Vec<u8>> {
        self.table
            .get(node)
            .and_then(|state| state.app.get(key))
            .map(|cell| cell.value.clone())
    }
}

// ─── Three-way exchange ──────────────────────────────────────────────────────

fn reframe(packet: GossipPacket) -> GossipPacket {
    let bytes = packet.encode(PROTOCOL_VERSION);
    GossipPacket::decode(&bytes, PROTOCOL_VERSION).expect("frame decodes")
}

/// Run one complete gossip round, `initiator` → `responder`.
///
/// Every message crosses a real encode/decode boundary, so the exchange
/// also proves the wire formats carry everything the merge rules need.
pub fn exchange(initiator: &mut SimNode, responder: &mut SimNode) {
    let now = Instant::now();
    let mut rng = rand::rng();

    let GossipPacket::Syn(syn) = reframe(GossipPacket::Syn(SynPacket {
        digests: digest_list(&initiator.table, &mut rng),
    })) else {
        unreachable!("syn reframes as syn");
    };

    // responder: reconcile only, no mutation before the ACK goes out
    let reconciliation = reconcile(&responder.table, &syn.digests);
    let GossipPacket::Ack(ack) = reframe(GossipPacket::Ack(AckPacket {
        digests: reconciliation.requests,
        states: reconciliation.deltas,
    })) else {
        unreachable!("ack reframes as ack");
    };

    // initiator: merge offers, then answer requests from the merged table
    for (node, state) in ack.states {
        initiator.table.apply_remote(node, state, now);
    }
    let answers = fulfill(&initiator.table, &ack.digests);
    let GossipPacket::Ack2(ack2) = reframe(GossipPacket::Ack2(Ack2Packet { states: answers }))
    else {
        unreachable!("ack2 reframes as ack2");
    };

    for (node, state) in ack2.states {
        responder.table.apply_remote(node, state, now);
    }
}

/// Whether two nodes hold identical gossip-visible content.
pub fn tables_agree(a: &SimNode, b: &SimNode) -> bool {
    if a.table.len() != b.table.len() {
        return false;
    }
    a.table.iter().all(|(id, state)| {
        b.table
            .get(id)
            .is_some_and(|other| state.same_content(other))
    })
}

// ─── Sim cluster ─────────────────────────────────────────────────────────────

/// N simulated nodes under random pairwise gossip.
pub struct SimCluster {
    /// The member nodes.
    pub nodes: Vec<SimNode>,
}

impl SimCluster {
    /// A cluster of `size` fresh nodes at [`DEFAULT_GENERATION`].
    pub fn new(size: usize) -> Self {
        Self {
            nodes: (0..size).map(|_| SimNode::new(DEFAULT_GENERATION)).collect(),
        }
    }

    /// Run one exchange between a random ordered pair of distinct nodes.
    pub fn random_round<R: Rng>(&mut self, rng: &mut R) {
        let size = self.nodes.len();
        if size < 2 {
            return;
        }
        let i = rng.random_range(0..size);
        let mut j = rng.random_range(0..size - 1);
        if j >= i {
            j += 1;
        }
        let (initiator, responder) = self.pair_mut(i, j);
        exchange(initiator, responder);
    }

    /// Whether every node agrees with every other.
    pub fn converged(&self) -> bool {
        self.nodes
            .windows(2)
            .all(|pair| tables_agree(&pair[0], &pair[1]))
    }

    fn pair_mut(&mut self, i: usize, j: usize) -> (&mut SimNode, &mut SimNode) {
        if i < j {
            let (left, right) = self.nodes.split_at_mut(j);
            (&mut left[i], &mut right[0])
        } else {
            let (left, right) = self.nodes.split_at_mut(i);
            (&mut right[0], &mut left[j])
        }
    }
}
