//! Configuration for the gossip subsystem.

use crate::node::NodeId;

/// Tunables for gossip periods, round timeouts, and failure detection.
///
/// One instance is handed to the gossip executor at start; nothing here is
/// hot-reloaded.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    /// Interval between gossip periods (ms).  Each period initiates up to
    /// three rounds: one live peer, maybe one unreachable peer, maybe one
    /// seed.  Default: `1_000`.
    pub gossip_interval_ms: u64,

    /// Soft deadline for an outstanding round (ms).  An expired round is
    /// abandoned without rollback; partial merges stand.  Default: `3_000`.
    pub round_timeout_ms: u64,

    /// Phi threshold above which a silent peer is declared dead.
    /// Default: `8.0`.
    pub phi_threshold: f64,

    /// Number of heartbeat inter-arrival gaps kept per peer for the
    /// accrual detector.  Default: `1_000`.
    pub arrival_window_size: usize,

    /// Gap estimate (ms) seeding a fresh arrival window, so the first
    /// suspicion reading is meaningful before real gaps accumulate.
    /// Default: `500`.
    pub first_gap_estimate_ms: u64,

    /// Seed nodes contacted probabilistically each period and always when
    /// no live peer is known.
    pub seeds: Vec<NodeId>,

    /// Capacity of the executor mailbox; packets beyond it are dropped
    /// and counted.  Default: `10_000`.
    pub mailbox_capacity: usize,

    /// Fixed generation override.  `None` derives the generation from
    /// wall-clock seconds at boot.  Operators who persist the last-known
    /// generation can pass `Some(persisted + 1)` to stay strictly
    /// monotonic across restarts faster than the clock resolution.
    pub generation: Option<u64>,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            gossip_interval_ms: 1_000,
            round_timeout_ms: 3_000,
            phi_threshold: 8.0,
            arrival_window_size: 1_000,
            first_gap_estimate_ms: 500,
            seeds: Vec::new(),
            mailbox_capacity: 10_000,
            generation: None,
        }
    }
}

impl GossipConfig {
    /// Aggressive timers for local development and tests.
    pub fn dev_default() -> Self {
        Self {
            gossip_interval_ms: 20,
            round_timeout_ms: 100,
            phi_threshold: 4.0,
            arrival_window_size: 64,
            first_gap_estimate_ms: 20,
            ..Self::default()
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
