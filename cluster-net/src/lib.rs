//! Meridian cluster networking layer.
//!
//! Wires the pure membership engine (`meridian-gossip`) to the outside
//! world: wire formats, transport seams, and the single-threaded gossip
//! executor that owns all cluster state.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────┐
//!  │  I/O threads                                     │
//!  │  PacketIntake: decode frame → mailbox            │
//!  └──────────────┬───────────────────────────────────┘
//!                 │  crossbeam mailbox (FIFO)
//!  ┌──────────────▼───────────────────────────────────┐
//!  │  Gossip executor thread                          │
//!  │  • owns EndpointStateTable / RoundTable          │
//!  │  • SYN → ACK → ACK2 exchanges                    │
//!  │  • failure detector sweep per period             │
//!  │  • publishes Membership view, fires listeners    │
//!  └──────────────┬───────────────────────────────────┘
//!                 │  TransportOut::send (best-effort)
//!  ┌──────────────▼───────────────────────────────────┐
//!  │  Transport (datagram; loopback hub for tests)    │
//!  └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`packet`]     | Wire types, tag-dispatched decoding, field codecs |
//! | [`transport`]  | `TransportOut`, `PacketIntake`, in-process loopback |
//! | [`gossiper`]   | The executor service and its mailbox |
//! | [`membership`] | `Membership` read handle and `ClusterListener` |
//! | [`clock`]      | Injected monotonic time source |
//! | [`stats`]      | Traffic and drop counters |
//! | [`error`]      | Crate-wide error enums |

pub mod clock;
pub mod error;
pub mod gossiper;
pub mod membership;
pub mod packet;
pub mod stats;
pub mod transport;

pub use {
    clock::{Clock, SystemClock},
    error::{ClusterNetError, TransportError},
    gossiper::{GossipEvent, Gossiper},
    membership::{ClusterListener, Membership},
    packet::{
        Ack2Packet, AckPacket, GossipPacket, PacketType, SynPacket, MIN_PROTOCOL_VERSION,
        PROTOCOL_VERSION,
    },
    stats::{GossipStats, StatsSnapshot},
    transport::{LoopbackNetwork, LoopbackTransport, PacketIntake, TransportOut},
};
