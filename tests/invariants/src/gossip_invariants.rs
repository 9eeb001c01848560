//! Membership-engine properties.
//!
//! The digest-symmetry generator builds *protocol-consistent* views: each
//! node's cells are stamped from one counter, and every partial view holds
//! exactly the cells at or below its cutoff, which is the shape real
//! tables take after any sequence of gossip rounds.

use {
    meridian_gossip::{
        digest::digest_list,
        node::{NodeId, NODE_ID_LEN},
        reconcile::{fulfill, reconcile},
        state::{ApplicationState, Heartbeat, NodeState, StateKey, VersionedBytes},
        table::EndpointStateTable,
    },
    proptest::prelude::*,
    std::time::Instant,
};

const KEYS: [StateKey; 4] = [
    StateKey::Status,
    StateKey::Load,
    StateKey::Dc,
    StateKey::Rack,
];

fn peer_id(index: usize) -> NodeId {
    NodeId::new([index as u8 + 1; NODE_ID_LEN])
}

fn raw_state(generation: u64, version: u64, cells: &[(StateKey, u64)]) -> NodeState {
    let mut app = ApplicationState::new();
    for (key, cell_version) in cells {
        app.set(
            *key,
            VersionedBytes::new(cell_version.to_le_bytes().to_vec(), *cell_version),
        );
    }
    NodeState::with_app(
        Heartbeat {
            generation,
            version,
        },
        app,
        Instant::now(),
    )
}

// ─── Protocol-consistent views ───────────────────────────────────────────────

/// The "true" history of one node: a counter high-water mark and cells
/// stamped with distinct versions drawn from that counter.
#[derive(Debug, Clone)]
struct OwnerState {
    total: u64,
    cells: Vec<(StateKey, u64)>,
}

fn owner_strategy() -> impl Strategy<Value = OwnerState> {
    (2u64..24).prop_flat_map(|total| {
        let versions: Vec<u64> = (1..=total).collect();
        proptest::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len()).prop_flat_map(
            move |keys| {
                let len = keys.len();
                proptest::sample::subsequence(versions.clone(), len).prop_map(move |vers| {
                    OwnerState {
                        total,
                        cells: keys.clone().into_iter().zip(vers).collect(),
                    }
                })
            },
        )
    })
}

/// A view of `owner` that has seen everything up to `cut`.  `cut == 0`
/// means the node is unknown to the viewer.
fn view(owner: &OwnerState, cut: u64) -> Option<NodeState> {
    if cut == 0 {
        return None;
    }
    let cells: Vec<(StateKey, u64)> = owner
        .cells
        .iter()
        .filter(|(_, version)| *version <= cut)
        .copied()
        .collect();
    Some(raw_state(1, cut, &cells))
}

proptest! {
    // P1: observed heartbeats never decrease
    #[test]
    fn prop_heartbeat_monotonic(updates in proptest::collection::vec((0u64..4, 0u64..16), 1..32)) {
        let now = Instant::now();
        let peer = peer_id(9);
        let mut table = EndpointStateTable::new(peer_id(0), 1, now);
        let mut observed = Heartbeat::ZERO;
        for (generation, version) in updates {
            table.apply_remote(peer, raw_state(generation, version, &[]), now);
            let heartbeat = table.get(&peer).unwrap().heartbeat;
            prop_assert!(heartbeat >= observed);
            observed = heartbeat;
        }
    }

    // P6: apply_remote(S); apply_remote(S) == apply_remote(S)
    #[test]
    fn prop_idempotent_merge(
        generation in 1u64..4,
        version in 1u64..20,
        cells in proptest::collection::vec(
            (proptest::sample::select(KEYS.to_vec()), 1u64..20),
            0..4,
        ),
    ) {
        let now = Instant::now();
        let peer = peer_id(7);
        let state = raw_state(generation, version, &cells);

        let mut once = EndpointStateTable::new(peer_id(0), 1, now);
        once.apply_remote(peer, state.clone(), now);

        let mut twice = EndpointStateTable::new(peer_id(0), 1, now);
        twice.apply_remote(peer, state.clone(), now);
        let second = twice.apply_remote(peer, state, now);

        prop_assert!(second.is_noop());
        prop_assert!(once.get(&peer).unwrap().same_content(twice.get(&peer).unwrap()));
    }

    // P3: requests answered from R carry exactly what L is missing
    #[test]
    fn prop_digest_symmetry(
        owners in proptest::collection::vec(owner_strategy(), 1..4),
        cuts in proptest::collection::vec((0u64..25, 1u64..25), 4),
    ) {
        let now = Instant::now();
        let mut l_table = EndpointStateTable::new(NodeId::new([0xaa; NODE_ID_LEN]), 1, now);
        let mut r_table = EndpointStateTable::new(NodeId::new([0xbb; NODE_ID_LEN]), 1, now);

        let mut cut_pairs = Vec::new();
        for (index, (owner, (raw_l, raw_r))) in owners.iter().zip(cuts).enumerate() {
            let node = peer_id(index);
            let cut_l = raw_l.min(owner.total);
            let cut_r = raw_r.min(owner.total).max(1);
            if let Some(state) = view(owner, cut_l) {
                l_table.apply_remote(node, state, now);
            }
            r_table.apply_remote(node, view(owner, cut_r).unwrap(), now);
            cut_pairs.push((node, owner.clone(), cut_l, cut_r));
        }

        let digests = digest_list(&r_table, &mut rand::rng());
        let requests = reconcile(&l_table, &digests).requests;
        let answered = fulfill(&r_table, &requests);

        for (node, owner, cut_l, cut_r) in &cut_pairs {
            let answer = answered.iter().find(|(id, _)| id == node).map(|(_, s)| s);
            for (key, version) in &owner.cells {
                let missing_from_l = *version > *cut_l && *version <= *cut_r;
                let offered = answer
                    .and_then(|state| state.app.get(*key))
                    .is_some_and(|cell| cell.version == *version);
                prop_assert_eq!(
                    offered,
                    missing_from_l,
                    "node {} key {:?} version {} (cuts {}..{})",
                    node, key, version, cut_l, cut_r
                );
            }
        }

        // applying the answers closes the gap completely
        for (node, state) in answered {
            l_table.apply_remote(node, state, now);
        }
        for (node, _, cut_l, cut_r) in &cut_pairs {
            let expected = (*cut_r).max(*cut_l);
            prop_assert_eq!(l_table.get(node).unwrap().max_version(), expected);
        }
    }

    // P2: a forward and a backward sweep of pairwise rounds converge the ring
    #[test]
    fn prop_pairwise_sweeps_converge(size in 2usize..6, extra_versions in proptest::collection::vec(1u64..6, 6)) {
        let now = Instant::now();
        let mut tables: Vec<EndpointStateTable> = (0..size)
            .map(|index| {
                let id = peer_id(index);
                let mut table = EndpointStateTable::new(id, 1, now);
                let bumps = extra_versions[index % extra_versions.len()];
                for _ in 0..bumps {
                    table.bump_heartbeat();
                }
                table
                    .bump_local(&id, StateKey::HostId, id.to_string().into_bytes())
                    .unwrap();
                table
            })
            .collect();

        let expected: Vec<(NodeId, Heartbeat)> = tables
            .iter()
            .map(|table| {
                let id = table.local_id();
                (id, table.get(&id).unwrap().heartbeat)
            })
            .collect();

        for index in 0..size - 1 {
            sync_pair(&mut tables, index, index + 1, now);
        }
        for index in (0..size - 1).rev() {
            sync_pair(&mut tables, index, index + 1, now);
        }

        for table in &tables {
            prop_assert_eq!(table.len(), size);
            for (node, heartbeat) in &expected {
                prop_assert_eq!(table.get(node).unwrap().heartbeat, *heartbeat);
                prop_assert!(table.get(node).unwrap().app.get(StateKey::HostId).is_some());
            }
        }
    }
}

/// One full bidirectional round between `tables[i]` and `tables[j]`.
fn sync_pair(tables: &mut [EndpointStateTable], i: usize, j: usize, now: Instant) {
    assert!(i < j);
    let (left, right) = tables.split_at_mut(j);
    let a = &mut left[i];
    let b = &mut right[0];

    let digests = digest_list(a, &mut rand::rng());
    let reconciliation = reconcile(b, &digests);
    for (node, state) in reconciliation.deltas {
        a.apply_remote(node, state, now);
    }
    let answers = fulfill(a, &reconciliation.requests);
    for (node, state) in answers {
        b.apply_remote(node, state, now);
    }
}
