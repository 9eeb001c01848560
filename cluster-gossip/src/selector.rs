//! Periodic gossip partner selection.
//!
//! Each period the local node initiates at most three rounds: always one
//! with a live peer when any exists, probabilistically one with an
//! unreachable peer, and probabilistically one with a seed.  The dead-peer
//! probability `dead / (live + 1)` keeps reprobing bounded: the expected
//! number of probes to unreachable nodes per period scales with the
//! unreachable fraction of the cluster.

use {
    crate::node::NodeId,
    rand::{seq::IndexedRandom, Rng},
};

/// Pick this period's gossip partners.
///
/// `live` and `unreachable` are the current liveness partition of the
/// known peers; `seeds` come from configuration.  The local node and
/// duplicates are never returned.
pub fn select_peers<R: Rng + ?Sized>(
    live: &[NodeId],
    unreachable: &[NodeId],
    seeds: &[NodeId],
    local: &NodeId,
    rng: &mut R,
) -> Vec<NodeId> {
    let live_peers: Vec<NodeId> = live.iter().filter(|id| *id != local).copied().collect();
    let live_count = live_peers.len();
    let mut targets: Vec<NodeId> = Vec::with_capacity(3);

    // 1. exactly one live peer, uniformly
    if let Some(peer) = live_peers.choose(rng) {
        targets.push(*peer);
    }

    // 2. one unreachable peer with probability dead / (live + 1)
    if !unreachable.is_empty() {
        let probability = unreachable.len() as f64 / (live_count + 1) as f64;
        if rng.random::<f64>() < probability {
            if let Some(peer) = unreachable.choose(rng) {
                if !targets.contains(peer) {
                    targets.push(*peer);
                }
            }
        }
    }

    // 3. one seed with probability 1 / (live + 1), or always when no live
    //    peer is known
    let seed_candidates: Vec<NodeId> = seeds
        .iter()
        .filter(|id| *id != local && !targets.contains(id))
        .copied()
        .collect();
    if !seed_candidates.is_empty() {
        let hit = live_count == 0 || rng.random::<f64>() < 1.0 / (live_count + 1) as f64;
        if hit {
            if let Some(seed) = seed_candidates.choose(rng) {
                targets.push(*seed);
            }
        }
    }

    targets
}

// ── Tests ───────────────────────────────────────────────────────────────────
