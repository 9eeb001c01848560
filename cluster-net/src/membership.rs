//! The membership surface other subsystems consume.
//!
//! Readers never touch the endpoint state table directly: the executor
//! publishes a copy of the liveness partition after every transition, and
//! [`Membership`] hands out clones of that view.  Listeners run on the
//! executor thread and must not block.

use {
    meridian_gossip::{node::NodeId, state::StateKey},
    parking_lot::RwLock,
    std::{collections::HashSet, sync::Arc},
};

/// Callbacks fired by the gossip executor on membership transitions.
///
/// All methods have empty defaults so implementors subscribe only to what
/// they need.  Delivered on the executor thread: keep them cheap.
pub trait ClusterListener: Send {
    /// A node was seen for the first time.
    fn on_join(&mut self, _node: NodeId) {}

    /// A node previously considered dead produced a fresh heartbeat.
    fn on_alive(&mut self, _node: NodeId) {}

    /// A node's suspicion crossed the threshold.
    fn on_dead(&mut self, _node: NodeId) {}

    /// An application-state cell changed.
    fn on_change(&mut self, _node: NodeId, _key: StateKey, _value: &[u8]) {}
}

#[derive(Debug, Default)]
struct MembershipView {
    live: HashSet<NodeId>,
    dead: HashSet<NodeId>,
}

/// Cloneable, thread-safe read handle over the cluster's liveness
/// partition.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    view: Arc<RwLock<MembershipView>>,
}

impl Membership {
    /// Nodes currently considered alive (the local node included).
    pub fn live_nodes(&self) -> HashSet<NodeId> {
        self.view.read().live.clone()
    }

    /// Nodes currently considered dead.
    pub fn dead_nodes(&self) -> HashSet<NodeId> {
        self.view.read().dead.clone()
    }

    /// Whether one node is currently considered alive.
    pub fn is_live(&self, node: &NodeId) -> bool {
        self.view.read().live.contains(node)
    }

    /// Total nodes known, live or dead.
    pub fn node_count(&self) -> usize {
        let view = self.view.read();
        view.live.len() + view.dead.len()
    }

    /// Replace the published view.  Called by the executor only.
    pub(crate) fn publish(&self, live: HashSet<NodeId>, dead: HashSet<NodeId>) {
        let mut view = self.view.write();
        view.live = live;
        view.dead = dead;
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
