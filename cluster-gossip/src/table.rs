//! The endpoint state table: the authoritative local view of the cluster.
//!
//! One instance exists per process, owned by the gossip executor thread.
//! Every mutation flows through the executor's mailbox, so the operations
//! here are plain `&mut self` methods with no interior locking.

use {
    crate::{
        error::{GossipError, Result},
        node::NodeId,
        state::{ApplicationState, Heartbeat, NodeState, StateKey, VersionedBytes},
    },
    log::{debug, warn},
    std::{cmp::Ordering, collections::HashMap, time::Instant},
};

/// What a remote merge actually did, for notification fan-out.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// The node was not in the table before this merge.
    pub joined: bool,
    /// A larger generation replaced the node's state wholesale.
    pub restarted: bool,
    /// The node's heartbeat moved forward (same or newer generation).
    pub heartbeat_advanced: bool,
    /// The node was considered dead and this merge revived it.
    pub revived: bool,
    /// Application-state cells that changed, for change listeners.
    pub changed: Vec<(NodeId, StateKey)>,
}

impl ApplyOutcome {
    /// Whether the merge changed anything at all.
    pub fn is_noop(&self) -> bool {
        !self.joined && !self.restarted && !self.heartbeat_advanced && self.changed.is_empty()
    }
}

/// Map from node identity to [`NodeState`].
///
/// Entries are created on first observation and never removed; a node that
/// leaves the ring stays in the table with `is_alive = false`.
#[derive(Debug)]
pub struct EndpointStateTable {
    local: NodeId,
    nodes: HashMap<NodeId, NodeState>,
}

impl EndpointStateTable {
    /// Create a table for `local`, seeding its own entry at version 1 of
    /// the given generation.
    pub fn new(local: NodeId, generation: u64, now: Instant) -> Self {
        let mut nodes = HashMap::new();
        let mut state = NodeState::new(Heartbeat::new(generation), now);
        state.is_alive = true;
        nodes.insert(local, state);
        Self { local, nodes }
    }

    /// The identity this table is local to.
    pub fn local_id(&self) -> NodeId {
        self.local
    }

    /// Number of known nodes, including the local one.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the table holds no entries.  The constructor seeds the
    /// local entry, so this is false for any table built normally.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up one node.
    pub fn get(&self, node: &NodeId) -> Option<&NodeState> {
        self.nodes.get(node)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeState)> {
        self.nodes.iter()
    }

    /// Idempotent insertion: returns the existing entry or a fresh
    /// zero-heartbeat one for a node known only by name.
    pub fn observe(&mut self, node: NodeId, now: Instant) -> &mut NodeState {
        self.nodes
            .entry(node)
            .or_insert_with(|| NodeState::new(Heartbeat::ZERO, now))
    }

    /// Consistent copy of the whole table for outbound message assembly.
    pub fn snapshot(&self) -> Vec<(NodeId, NodeState)> {
        self.nodes
            .iter()
            .map(|(id, state)| (*id, state.clone()))
            .collect()
    }

    // ── Local writer ────────────────────────────────────────────────────

    /// Bump the local heartbeat version and store `key` at the new
    /// version.  Rejected for any node other than the local one; the
    /// table is untouched on rejection.
    pub fn bump_local(&mut self, node: &NodeId, key: StateKey, value: Vec<u8>) -> Result<u64> {
        if *node != self.local {
            warn!("rejecting local state write for remote node {node}");
            return Err(GossipError::NotLocalNode(*node));
        }
        let version = self.bump_heartbeat();
        if let Some(state) = self.nodes.get_mut(&self.local) {
            state.app.set(key, VersionedBytes::new(value, version));
        }
        Ok(version)
    }

    /// Advance the local heartbeat version by one and return it.  Called
    /// once per gossip period so digests keep moving even when no
    /// application state changes.
    pub fn bump_heartbeat(&mut self) -> u64 {
        match self.nodes.get_mut(&self.local) {
            Some(state) => {
                state.heartbeat.version += 1;
                state.heartbeat.version
            }
            // the constructor always seeds the local entry
            None => 0,
        }
    }

    /// Flip a node's liveness verdict.  Returns `true` when the flag
    /// actually changed.  The local node is never marked dead.
    pub fn set_alive(&mut self, node: &NodeId, alive: bool) -> bool {
        if *node == self.local && !alive {
            return false;
        }
        match self.nodes.get_mut(node) {
            Some(state) if state.is_alive != alive => {
                state.is_alive = alive;
                true
            }
            _ => false,
        }
    }

    // ── Delta extraction ────────────────────────────────────────────────

    /// The fragments of `node`'s state with version greater than `floor`,
    /// carrying the current heartbeat.  `None` when nothing qualifies or
    /// the node is unknown.
    pub fn state_above(&self, node: &NodeId, floor: u64) -> Option<NodeState> {
        let state = self.nodes.get(node)?;
        let mut app = ApplicationState::new();
        for (key, cell) in state.app.iter() {
            if cell.version > floor {
                app.set(*key, cell.clone());
            }
        }
        if app.is_empty() && state.heartbeat.version <= floor {
            return None;
        }
        Some(NodeState {
            heartbeat: state.heartbeat,
            app,
            is_alive: state.is_alive,
            last_seen: state.last_seen,
        })
    }

    // ── Remote merge ────────────────────────────────────────────────────

    /// Merge a remote node state into the table.
    ///
    /// A strictly newer generation replaces the entry wholesale; within
    /// the same generation the heartbeat version takes the maximum and
    /// each cell is kept only when its remote version is strictly
    /// greater.  Older generations are discarded.  State about the local
    /// node is ignored: the local writer is the only authority for its
    /// own counter.
    pub fn apply_remote(
        &mut self,
        node: NodeId,
        remote: NodeState,
        now: Instant,
    ) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        if node == self.local {
            debug!("ignoring gossip about the local node");
            return outcome;
        }

        let Some(local) = self.nodes.get_mut(&node) else {
            outcome.joined = true;
            outcome.heartbeat_advanced = remote.heartbeat > Heartbeat::ZERO;
            outcome.changed = remote.app.keys().map(|key| (node, *key)).collect();
            let mut state = remote;
            state.is_alive = outcome.heartbeat_advanced;
            state.last_seen = now;
            self.nodes.insert(node, state);
            return outcome;
        };

        match remote.heartbeat.generation.cmp(&local.heartbeat.generation) {
            Ordering::Less => {
                debug!(
                    "discarding stale generation {} for {node} (local {})",
                    remote.heartbeat.generation, local.heartbeat.generation
                );
            }
            Ordering::Greater => {
                // restart: the old incarnation's state is dropped wholesale
                outcome.restarted = true;
                outcome.heartbeat_advanced = true;
                outcome.revived = !local.is_alive;
                outcome.changed = remote.app.keys().map(|key| (node, *key)).collect();
                let mut state = remote;
                state.is_alive = true;
                state.last_seen = now;
                *local = state;
            }
            Ordering::Equal => {
                if remote.heartbeat.version > local.heartbeat.version {
                    local.heartbeat.version = remote.heartbeat.version;
                    outcome.heartbeat_advanced = true;
                    outcome.revived = !local.is_alive;
                    local.is_alive = true;
                    local.last_seen = now;
                }
                for (key, cell) in remote.app.iter() {
                    let newer = local
                        .app
                        .get(*key)
                        .map_or(true, |existing| cell.version > existing.version);
                    if newer {
                        local.app.set(*key, cell.clone());
                        outcome.changed.push((node, *key));
                    }
                }
            }
        }
        outcome
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
