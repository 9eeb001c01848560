//! Gossip wire formats.
//!
//! Every frame on the gossip channel is one tag byte followed by the
//! packet body.  Decoding dispatches through [`PacketType`]: tag → decoder
//! function, no open-ended packet hierarchy.  All encoders and decoders
//! take the protocol `version` so a future line can branch; readers ignore
//! unknown trailing bytes, which is what keeps the format forward
//! compatible within a major line.
//!
//! ## Frame layouts
//!
//! ```text
//! digest:       node-id  varlong(generation)  varlong(max-version)
//! digest list:  varint(count)  digest × count
//! node state:   varlong(generation)  varlong(version)  varint(nstates)
//!               (key-code  varint-len value-bytes  varlong(version)) × nstates
//! state map:    varint(nmap)  (node-id  node-state) × nmap
//!
//! SYN  = [0x01] digest-list
//! ACK  = [0x02] digest-list state-map
//! ACK2 = [0x03] state-map
//! ```

use {
    crate::stats::GossipStats,
    meridian_gossip::{
        digest::GossipDigest,
        node::{NodeId, NODE_ID_LEN},
        state::{ApplicationState, Heartbeat, NodeState, StateKey, VersionedBytes},
    },
    meridian_storage_codec::{
        buffer::{ReadBuffer, WriteBuffer},
        error::{CodecError, Result},
    },
    std::time::Instant,
};

/// Current protocol line.
pub const PROTOCOL_VERSION: u32 = 1;

/// Oldest line this build can still decode.
pub const MIN_PROTOCOL_VERSION: u32 = 1;

fn check_version(version: u32) -> Result<()> {
    if version < MIN_PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    Ok(())
}

// ── Packet types ────────────────────────────────────────────────────────────

/// Wire tag of each gossip packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// First message of a round: the initiator's digests.
    DigestSyn,
    /// The responder's requests and offers.
    DigestAck,
    /// The initiator's closing deltas.
    DigestAck2,
}

type Decoder = fn(&mut ReadBuffer<'_>, u32) -> Result<GossipPacket>;

impl PacketType {
    /// The tag byte opening every frame of this type.
    pub fn tag(self) -> u8 {
        match self {
            PacketType::DigestSyn => 1,
            PacketType::DigestAck => 2,
            PacketType::DigestAck2 => 3,
        }
    }

    /// Map a received tag byte back to a packet type.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PacketType::DigestSyn),
            2 => Some(PacketType::DigestAck),
            3 => Some(PacketType::DigestAck2),
            _ => None,
        }
    }

    fn decoder(self) -> Decoder {
        match self {
            PacketType::DigestSyn => decode_syn,
            PacketType::DigestAck => decode_ack,
            PacketType::DigestAck2 => decode_ack2,
        }
    }
}

// ── Packets ─────────────────────────────────────────────────────────────────

/// Round opener: the initiator's view, summarised.
#[derive(Debug, Clone, PartialEq)]
pub struct SynPacket {
    /// One digest per node the initiator knows, pre-shuffled.
    pub digests: Vec<GossipDigest>,
}

/// Second message: what the responder wants and what it offers.
#[derive(Debug, Clone)]
pub struct AckPacket {
    /// Request digests (`max_version == 0` asks for full state).
    pub digests: Vec<GossipDigest>,
    /// Offered node states.
    pub states: Vec<(NodeId, NodeState)>,
}

/// Closing message: the initiator's answers to the responder's requests.
#[derive(Debug, Clone)]
pub struct Ack2Packet {
    /// Offered node states.
    pub states: Vec<(NodeId, NodeState)>,
}

/// Top-level gossip frame.
#[derive(Debug, Clone)]
pub enum GossipPacket {
    Syn(SynPacket),
    Ack(AckPacket),
    Ack2(Ack2Packet),
}

impl GossipPacket {
    /// The wire tag for this packet.
    pub fn packet_type(&self) -> PacketType {
        match self {
            GossipPacket::Syn(_) => PacketType::DigestSyn,
            GossipPacket::Ack(_) => PacketType::DigestAck,
            GossipPacket::Ack2(_) => PacketType::DigestAck2,
        }
    }

    /// Human-readable tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            GossipPacket::Syn(_) => "syn",
            GossipPacket::Ack(_) => "ack",
            GossipPacket::Ack2(_) => "ack2",
        }
    }

    /// Encode tag byte plus body.
    pub fn encode(&self, version: u32) -> Vec<u8> {
        let mut buf = WriteBuffer::new();
        buf.put_u8(self.packet_type().tag());
        match self {
            GossipPacket::Syn(syn) => {
                write_digest_list(&mut buf, &syn.digests, version);
            }
            GossipPacket::Ack(ack) => {
                write_digest_list(&mut buf, &ack.digests, version);
                write_state_map(&mut buf, &ack.states, version);
            }
            GossipPacket::Ack2(ack2) => {
                write_state_map(&mut buf, &ack2.states, version);
            }
        }
        buf.into_bytes()
    }

    /// Decode a received frame.
    ///
    /// Trailing bytes beyond the known fields are ignored; a newer minor
    /// line may append fields this reader does not know about.
    pub fn decode(bytes: &[u8], version: u32) -> Result<Self> {
        check_version(version)?;
        let mut buf = ReadBuffer::new(bytes);
        let tag = buf.get_u8()?;
        let packet_type = PacketType::from_tag(tag)
            .ok_or_else(|| CodecError::corrupt(format!("unknown packet tag {tag}")))?;
        (packet_type.decoder())(&mut buf, version)
    }
}

fn decode_syn(buf: &mut ReadBuffer<'_>, version: u32) -> Result<GossipPacket> {
    Ok(GossipPacket::Syn(SynPacket {
        digests: read_digest_list(buf, version)?,
    }))
}

fn decode_ack(buf: &mut ReadBuffer<'_>, version: u32) -> Result<GossipPacket> {
    Ok(GossipPacket::Ack(AckPacket {
        digests: read_digest_list(buf, version)?,
        states: read_state_map(buf, version)?,
    }))
}

fn decode_ack2(buf: &mut ReadBuffer<'_>, version: u32) -> Result<GossipPacket> {
    Ok(GossipPacket::Ack2(Ack2Packet {
        states: read_state_map(buf, version)?,
    }))
}

// ── Field codecs ────────────────────────────────────────────────────────────

/// Write a node id: varint length then identity bytes.
pub fn write_node_id(buf: &mut WriteBuffer, id: &NodeId) {
    buf.put_varint(NODE_ID_LEN as u64);
    buf.put_slice(id.as_bytes());
}

/// Read a node id written by [`write_node_id`].
pub fn read_node_id(buf: &mut ReadBuffer<'_>) -> Result<NodeId> {
    let len = buf.get_varint()? as usize;
    if len != NODE_ID_LEN {
        return Err(CodecError::corrupt(format!(
            "unsupported node id length {len}"
        )));
    }
    let slice = buf.get_slice(len)?;
    let mut bytes = [0u8; NODE_ID_LEN];
    bytes.copy_from_slice(slice);
    Ok(NodeId::from_bytes(bytes))
}

fn write_digest(buf: &mut WriteBuffer, digest: &GossipDigest, _version: u32) {
    write_node_id(buf, &digest.node);
    buf.put_varlong(digest.generation as i64);
    buf.put_varlong(digest.max_version as i64);
}

fn read_digest(buf: &mut ReadBuffer<'_>, _version: u32) -> Result<GossipDigest> {
    let node = read_node_id(buf)?;
    let generation = buf.get_varlong()? as u64;
    let max_version = buf.get_varlong()? as u64;
    Ok(GossipDigest::new(node, generation, max_version))
}

/// Write a digest list: varint count then each digest.
pub fn write_digest_list(buf: &mut WriteBuffer, digests: &[GossipDigest], version: u32) {
    buf.put_varint(digests.len() as u64);
    for digest in digests {
        write_digest(buf, digest, version);
    }
}

/// Read a digest list written by [`write_digest_list`].
pub fn read_digest_list(buf: &mut ReadBuffer<'_>, version: u32) -> Result<Vec<GossipDigest>> {
    let count = buf.get_varint()? as usize;
    let mut digests = Vec::with_capacity(count.min(1_024));
    for _ in 0..count {
        digests.push(read_digest(buf, version)?);
    }
    Ok(digests)
}

/// Write one node state: heartbeat, then each application-state cell.
pub fn write_node_state(buf: &mut WriteBuffer, state: &NodeState, _version: u32) {
    buf.put_varlong(state.heartbeat.generation as i64);
    buf.put_varlong(state.heartbeat.version as i64);
    buf.put_varint(state.app.len() as u64);
    for (key, cell) in state.app.iter() {
        buf.put_u8(key.code());
        buf.put_len_bytes(&cell.value);
        buf.put_varlong(cell.version as i64);
    }
}

/// Read a node state written by [`write_node_state`].
///
/// Liveness fields are local judgements and are not on the wire; a decoded
/// state starts out not-alive and is classified during the merge.
pub fn read_node_state(buf: &mut ReadBuffer<'_>, _version: u32) -> Result<NodeState> {
    let generation = buf.get_varlong()? as u64;
    let version = buf.get_varlong()? as u64;
    let nstates = buf.get_varint()? as usize;
    let mut app = ApplicationState::new();
    for _ in 0..nstates {
        let key = StateKey::from_code(buf.get_u8()?);
        let value = buf.get_len_bytes()?.to_vec();
        let cell_version = buf.get_varlong()? as u64;
        app.set(key, VersionedBytes::new(value, cell_version));
    }
    Ok(NodeState::with_app(
        Heartbeat {
            generation,
            version,
        },
        app,
        Instant::now(),
    ))
}

/// Write a `(node, state)` map: varint count then each pair.
pub fn write_state_map(
    buf: &mut WriteBuffer,
    states: &[(NodeId, NodeState)],
    version: u32,
) {
    buf.put_varint(states.len() as u64);
    for (node, state) in states {
        write_node_id(buf, node);
        write_node_state(buf, state, version);
    }
}

/// Read a state map written by [`write_state_map`].
pub fn read_state_map(
    buf: &mut ReadBuffer<'_>,
    version: u32,
) -> Result<Vec<(NodeId, NodeState)>> {
    let count = buf.get_varint()? as usize;
    let mut states = Vec::with_capacity(count.min(1_024));
    for _ in 0..count {
        let node = read_node_id(buf)?;
        let state = read_node_state(buf, version)?;
        states.push((node, state));
    }
    Ok(states)
}

/// Decode with drop-and-count semantics: a corrupt frame bumps the
/// counter and yields `None`, never an error that could leak upward into
/// state handling.
pub fn decode_counted(bytes: &[u8], version: u32, stats: &GossipStats) -> Option<GossipPacket> {
    match GossipPacket::decode(bytes, version) {
        Ok(packet) => Some(packet),
        Err(err) => {
            log::warn!("dropping undecodable gossip frame: {err}");
            GossipStats::inc(&stats.corrupt_dropped);
            None
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
