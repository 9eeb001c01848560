//! Fuzz the gossip packet codecs.
//!
//! Goals:
//! - Arbitrary frames never panic the decoder; corrupt input yields a
//!   clean error, a valid prefix decodes even with trailing garbage.
//! - Every constructible packet survives an encode/decode round trip.

#![no_main]

use {
    arbitrary::Arbitrary,
    libfuzzer_sys::fuzz_target,
    meridian_cluster_net::packet::{
        Ack2Packet, AckPacket, GossipPacket, SynPacket, PROTOCOL_VERSION,
    },
    meridian_gossip::{
        digest::GossipDigest,
        node::{NodeId, NODE_ID_LEN},
        state::{ApplicationState, Heartbeat, NodeState, StateKey, VersionedBytes},
    },
    std::time::Instant,
};

#[derive(Debug, Arbitrary)]
struct FuzzDigest {
    node: [u8; NODE_ID_LEN],
    generation: u64,
    max_version: u64,
}

impl FuzzDigest {
    fn into_digest(self) -> GossipDigest {
        GossipDigest::new(NodeId::new(self.node), self.generation, self.max_version)
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzCell {
    key: u8,
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Arbitrary)]
struct FuzzState {
    node: [u8; NODE_ID_LEN],
    generation: u64,
    version: u64,
    cells: Vec<FuzzCell>,
}

impl FuzzState {
    fn into_state(self) -> (NodeId, NodeState) {
        let mut app = ApplicationState::new();
        for cell in self.cells {
            app.set(
                StateKey::from_code(cell.key),
                VersionedBytes::new(cell.value, cell.version),
            );
        }
        let state = NodeState::with_app(
            Heartbeat {
                generation: self.generation,
                version: self.version,
            },
            app,
            Instant::now(),
        );
        (NodeId::new(self.node), state)
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzCase {
    /// Raw bytes into the frame decoder.
    Decode(Vec<u8>),
    /// Round-trip a SYN.
    Syn(Vec<FuzzDigest>),
    /// Round-trip an ACK.
    Ack(Vec<FuzzDigest>, Vec<FuzzState>),
    /// Round-trip an ACK2.
    Ack2(Vec<FuzzState>),
}

fn roundtrip(packet: GossipPacket) -> GossipPacket {
    let bytes = packet.encode(PROTOCOL_VERSION);
    GossipPacket::decode(&bytes, PROTOCOL_VERSION).expect("own encoding decodes")
}

fn assert_states_match(sent: &[(NodeId, NodeState)], received: &[(NodeId, NodeState)]) {
    assert_eq!(sent.len(), received.len());
    for ((sent_id, sent_state), (recv_id, recv_state)) in sent.iter().zip(received) {
        assert_eq!(sent_id, recv_id);
        assert!(sent_state.same_content(recv_state));
    }
}

fuzz_target!(|case: FuzzCase| {
    match case {
        FuzzCase::Decode(bytes) => {
            let _ = GossipPacket::decode(&bytes, PROTOCOL_VERSION);
        }
        FuzzCase::Syn(digests) => {
            let digests: Vec<GossipDigest> =
                digests.into_iter().map(FuzzDigest::into_digest).collect();
            let GossipPacket::Syn(decoded) = roundtrip(GossipPacket::Syn(SynPacket {
                digests: digests.clone(),
            })) else {
                panic!("syn decoded as another kind");
            };
            assert_eq!(decoded.digests, digests);
        }
        FuzzCase::Ack(digests, states) => {
            let digests: Vec<GossipDigest> =
                digests.into_iter().map(FuzzDigest::into_digest).collect();
            let states: Vec<(NodeId, NodeState)> =
                states.into_iter().map(FuzzState::into_state).collect();
            let GossipPacket::Ack(decoded) = roundtrip(GossipPacket::Ack(AckPacket {
                digests: digests.clone(),
                states: states.clone(),
            })) else {
                panic!("ack decoded as another kind");
            };
            assert_eq!(decoded.digests, digests);
            assert_states_match(&states, &decoded.states);
        }
        FuzzCase::Ack2(states) => {
            let states: Vec<(NodeId, NodeState)> =
                states.into_iter().map(FuzzState::into_state).collect();
            let GossipPacket::Ack2(decoded) =
                roundtrip(GossipPacket::Ack2(Ack2Packet {
                    states: states.clone(),
                }))
            else {
                panic!("ack2 decoded as another kind");
            };
            assert_states_match(&states, &decoded.states);
        }
    }
});
