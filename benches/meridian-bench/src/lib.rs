//! Shared fixtures for the Meridian benchmarks.

use {
    meridian_gossip::{
        node::NodeId,
        state::{Heartbeat, NodeState, StateKey, VersionedBytes},
        table::EndpointStateTable,
    },
    meridian_storage_codec::versioned::VersionedValue,
    std::time::Instant,
};

/// A batch of committed values (codec fast path).
pub fn committed_batch(len: usize) -> Vec<VersionedValue<Vec<u8>>> {
    (0..len)
        .map(|index| VersionedValue::committed(format!("value-{index:08}").into_bytes()))
        .collect()
}

/// A batch with pending tids and nulls mixed in (codec slow path).
pub fn mixed_batch(len: usize) -> Vec<VersionedValue<Vec<u8>>> {
    (0..len)
        .map(|index| {
            let tid = if index % 3 == 0 { index as i64 } else { 0 };
            let value = if index % 7 == 0 {
                None
            } else {
                Some(format!("value-{index:08}").into_bytes())
            };
            VersionedValue::pending(tid, value)
        })
        .collect()
}

/// A populated endpoint state table with `peers` remote nodes.
pub fn populated_table(peers: usize) -> EndpointStateTable {
    let now = Instant::now();
    let mut table = EndpointStateTable::new(NodeId::random(), 1, now);
    for index in 0..peers {
        let node = NodeId::random();
        let mut state = NodeState::new(
            Heartbeat {
                generation: 1,
                version: (index as u64 % 40) + 1,
            },
            now,
        );
        state.app.set(
            StateKey::Load,
            VersionedBytes::new(index.to_le_bytes().to_vec(), (index as u64 % 40) + 1),
        );
        table.apply_remote(node, state, now);
    }
    table
}
