//! Gossip traffic counters.
//!
//! Packet-level errors are recovered locally by design: the offending
//! frame is dropped and the matching counter bumped, so operators can see
//! corruption or overload without any packet ever mutating state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the executor, the packet intake, and callers.
#[derive(Debug, Default)]
pub struct GossipStats {
    /// Packets handed to the transport.
    pub packets_sent: AtomicU64,
    /// Decoded packets delivered to the executor.
    pub packets_received: AtomicU64,
    /// Frames dropped because they failed to decode.
    pub corrupt_dropped: AtomicU64,
    /// Packets dropped for arriving outside any outstanding round.
    pub stale_dropped: AtomicU64,
    /// Sends the transport refused.
    pub send_failures: AtomicU64,
    /// Decoded packets dropped because the mailbox was full.
    pub mailbox_dropped: AtomicU64,
    /// Rounds initiated.
    pub rounds_started: AtomicU64,
    /// Rounds that reached `Done` on either side.
    pub rounds_completed: AtomicU64,
    /// Rounds abandoned on their soft deadline.
    pub rounds_expired: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub corrupt_dropped: u64,
    pub stale_dropped: u64,
    pub send_failures: u64,
    pub mailbox_dropped: u64,
    pub rounds_started: u64,
    pub rounds_completed: u64,
    pub rounds_expired: u64,
}

impl GossipStats {
    /// Bump one counter.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            corrupt_dropped: self.corrupt_dropped.load(Ordering::Relaxed),
            stale_dropped: self.stale_dropped.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            mailbox_dropped: self.mailbox_dropped.load(Ordering::Relaxed),
            rounds_started: self.rounds_started.load(Ordering::Relaxed),
            rounds_completed: self.rounds_completed.load(Ordering::Relaxed),
            rounds_expired: self.rounds_expired.load(Ordering::Relaxed),
        }
    }
}
