//! Meridian cluster membership engine.
//!
//! The deterministic core of the gossip subsystem: given the same sequence
//! of merges, ticks, and packets, the types here always produce the same
//! state transitions and outputs.  All I/O, threading, and wire encoding
//! live in `meridian-cluster-net`; this crate is pure state-machine logic.
//!
//! ## Crate modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`node`]      | `NodeId`, the stable per-process identity |
//! | [`state`]     | Heartbeats, application state, per-node state |
//! | [`table`]     | `EndpointStateTable`, the authoritative local view |
//! | [`digest`]    | `(node, generation, max-version)` summaries |
//! | [`reconcile`] | The digest reconciliation algorithm |
//! | [`round`]     | SYN / ACK / ACK2 round state machine |
//! | [`selector`]  | Live / unreachable / seed partner selection |
//! | [`detector`]  | Phi-accrual failure detector |
//! | [`config`]    | `GossipConfig` tunables |
//! | [`error`]     | `GossipError` |

pub mod config;
pub mod detector;
pub mod digest;
pub mod error;
pub mod node;
pub mod reconcile;
pub mod round;
pub mod selector;
pub mod state;
pub mod table;

pub use {
    config::GossipConfig,
    detector::FailureDetector,
    digest::{digest_list, GossipDigest},
    error::GossipError,
    node::NodeId,
    reconcile::{fulfill, reconcile, Reconciliation},
    round::{GossipRound, RoundPhase, RoundTable},
    selector::select_peers,
    state::{ApplicationState, Heartbeat, NodeState, StateKey, VersionedBytes},
    table::{ApplyOutcome, EndpointStateTable},
};
