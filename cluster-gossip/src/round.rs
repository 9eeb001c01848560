//! The three-way gossip round state machine.
//!
//! One round per peer may be outstanding at a time.  The same table serves
//! both the initiator and responder roles, distinguished purely by the
//! phase recorded for the peer:
//!
//! ```text
//! initiator:  (begin) ──▶ SynSent ──ACK──▶ Done
//! responder:  (SYN)   ──▶ AckReplied ──ACK2──▶ Done
//! ```
//!
//! Rounds carry a soft deadline.  Expiry abandons the round without
//! rolling anything back: partial merges from an ACK are legitimate state.

use {
    crate::node::NodeId,
    std::{
        collections::HashMap,
        time::{Duration, Instant},
    },
};

/// Where one outstanding round currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// We initiated: SYN is out, waiting for the peer's ACK.
    SynSent,
    /// We responded to a SYN with an ACK, waiting for ACK2.
    AckReplied,
    /// The exchange completed; terminal.
    Done,
}

/// One outstanding exchange with a peer.
#[derive(Debug, Clone, Copy)]
pub struct GossipRound {
    /// The peer on the other end.
    pub peer: NodeId,
    /// Current phase.
    pub phase: RoundPhase,
    /// Soft deadline after which the round is abandoned.
    pub deadline: Instant,
}

/// All outstanding rounds, keyed by peer.
///
/// Completed rounds leave the table immediately; only `SynSent` and
/// `AckReplied` entries are ever stored.
#[derive(Debug)]
pub struct RoundTable {
    rounds: HashMap<NodeId, GossipRound>,
    timeout: Duration,
}

impl RoundTable {
    /// Create a table with the configured round timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            rounds: HashMap::new(),
            timeout,
        }
    }

    /// Number of rounds in flight.
    pub fn outstanding(&self) -> usize {
        self.rounds.len()
    }

    /// Current round with `peer`, if any.
    pub fn get(&self, peer: &NodeId) -> Option<&GossipRound> {
        self.rounds.get(peer)
    }

    /// Start an initiated round.  A new round to the same peer is allowed
    /// before the prior one completes; the old entry is simply replaced.
    pub fn begin(&mut self, peer: NodeId, now: Instant) {
        self.rounds.insert(
            peer,
            GossipRound {
                peer,
                phase: RoundPhase::SynSent,
                deadline: now + self.timeout,
            },
        );
    }

    /// Record that a SYN arrived and an ACK reply is going out.
    pub fn open_responder(&mut self, peer: NodeId, now: Instant) {
        self.rounds.insert(
            peer,
            GossipRound {
                peer,
                phase: RoundPhase::AckReplied,
                deadline: now + self.timeout,
            },
        );
    }

    /// Accept an ACK from `peer`.  Valid only in `SynSent`; returns the
    /// completed round, or `None` for a stale packet the caller should
    /// drop.
    pub fn accept_ack(&mut self, peer: &NodeId) -> Option<GossipRound> {
        self.complete(peer, RoundPhase::SynSent)
    }

    /// Accept an ACK2 from `peer`.  Valid only in `AckReplied`.
    pub fn accept_ack2(&mut self, peer: &NodeId) -> Option<GossipRound> {
        self.complete(peer, RoundPhase::AckReplied)
    }

    fn complete(&mut self, peer: &NodeId, expected: RoundPhase) -> Option<GossipRound> {
        match self.rounds.get(peer) {
            Some(round) if round.phase == expected => {
                let mut round = self.rounds.remove(peer)?;
                round.phase = RoundPhase::Done;
                Some(round)
            }
            _ => None,
        }
    }

    /// Abandon every round whose deadline has passed, returning the
    /// affected peers.
    pub fn expire(&mut self, now: Instant) -> Vec<NodeId> {
        let expired: Vec<NodeId> = self
            .rounds
            .values()
            .filter(|round| round.deadline <= now)
            .map(|round| round.peer)
            .collect();
        for peer in &expired {
            self.rounds.remove(peer);
        }
        expired
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
