//! Transport seams for gossip traffic.
//!
//! Gossip is datagram-shaped: fire-and-forget packets with no delivery
//! guarantee and no flow control beyond the gossip period itself.  The
//! executor writes through [`TransportOut`]; inbound frames enter through
//! a [`PacketIntake`], which decodes on the I/O thread and posts only
//! well-formed packets into the executor mailbox.  Corrupt frames die at
//! the edge, counted, without ever touching membership state.
//!
//! [`LoopbackNetwork`] wires several intakes together in-process for the
//! test harness; real socket loops live below the packet boundary and
//! outside this crate.

use {
    crate::{
        error::TransportError,
        gossiper::GossipEvent,
        packet::decode_counted,
        stats::GossipStats,
    },
    crossbeam_channel::{Sender, TrySendError},
    log::{debug, warn},
    meridian_gossip::node::NodeId,
    parking_lot::RwLock,
    std::{collections::HashMap, sync::Arc},
};

/// Outbound side: best-effort datagram send.
pub trait TransportOut: Send + Sync {
    /// Hand one encoded packet to the network.  Failure is reported but
    /// the caller only logs and counts it; peer demotion is the failure
    /// detector's job.
    fn send(&self, peer: &NodeId, packet: &[u8]) -> Result<(), TransportError>;
}

/// Inbound side: the hand-off point from I/O threads to the executor.
#[derive(Clone)]
pub struct PacketIntake {
    tx: Sender<GossipEvent>,
    stats: Arc<GossipStats>,
    version: u32,
}

impl PacketIntake {
    pub(crate) fn new(tx: Sender<GossipEvent>, stats: Arc<GossipStats>, version: u32) -> Self {
        Self { tx, stats, version }
    }

    /// Decode one received frame and post it to the executor.
    ///
    /// Runs on the I/O thread.  Undecodable frames and mailbox overflow
    /// both end here as counted drops.
    pub fn deliver(&self, from: NodeId, bytes: &[u8]) {
        let Some(packet) = decode_counted(bytes, self.version, &self.stats) else {
            return;
        };
        match self.tx.try_send(GossipEvent::Packet { from, packet }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("gossip mailbox full, dropping packet from {from}");
                GossipStats::inc(&self.stats.mailbox_dropped);
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("gossip executor stopped, dropping packet from {from}");
            }
        }
    }
}

// ── In-process loopback ─────────────────────────────────────────────────────

/// In-process packet hub connecting several gossipers.
///
/// Each registered node gets a [`LoopbackTransport`] handle whose sends
/// are routed synchronously into the destination's intake.
#[derive(Default)]
pub struct LoopbackNetwork {
    endpoints: RwLock<HashMap<NodeId, PacketIntake>>,
}

impl LoopbackNetwork {
    /// Create an empty hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a node's intake to the hub.
    pub fn register(&self, node: NodeId, intake: PacketIntake) {
        self.endpoints.write().insert(node, intake);
    }

    /// Detach a node, simulating its disappearance from the network.
    pub fn unregister(&self, node: &NodeId) {
        self.endpoints.write().remove(node);
    }

    /// An outbound handle sending as `local`.
    pub fn transport(self: &Arc<Self>, local: NodeId) -> Arc<LoopbackTransport> {
        Arc::new(LoopbackTransport {
            network: Arc::clone(self),
            local,
        })
    }

    fn route(&self, from: NodeId, to: &NodeId, bytes: &[u8]) -> Result<(), TransportError> {
        let endpoints = self.endpoints.read();
        match endpoints.get(to) {
            Some(intake) => {
                intake.deliver(from, bytes);
                Ok(())
            }
            None => Err(TransportError::Unreachable(*to)),
        }
    }
}

/// Per-node outbound handle for a [`LoopbackNetwork`].
pub struct LoopbackTransport {
    network: Arc<LoopbackNetwork>,
    local: NodeId,
}

impl TransportOut for LoopbackTransport {
    fn send(&self, peer: &NodeId, packet: &[u8]) -> Result<(), TransportError> {
        self.network.route(self.local, peer, packet)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
