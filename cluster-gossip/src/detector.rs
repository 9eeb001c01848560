//! Accrual failure detection.
//!
//! Instead of a binary timeout, each peer carries a real-valued suspicion
//! score derived from the history of its heartbeat inter-arrival gaps.
//! The score grows continuously while a peer stays silent, so the
//! threshold trades detection latency against false positives without a
//! magic timeout constant.
//!
//! `suspicion` follows the classic phi formula under an exponential
//! arrival model: `phi = (now - last_arrival) / mean_gap * log10(e)`.
//! With the default threshold of 8, a peer is declared dead after staying
//! silent for roughly 18 mean gaps.

use {
    crate::node::NodeId,
    std::{
        collections::HashMap,
        collections::VecDeque,
        time::{Duration, Instant},
    },
};

/// log10(e); converts gaps-over-mean into the conventional phi scale.
const LOG10_E: f64 = std::f64::consts::LOG10_E;

/// Floor for the mean gap so a burst of rapid heartbeats cannot divide
/// the score by a near-zero mean.
const MIN_MEAN_MS: f64 = 1.0;

/// Sliding window of heartbeat inter-arrival gaps for one peer.
#[derive(Debug)]
struct ArrivalWindow {
    gaps_ms: VecDeque<f64>,
    last_arrival: Instant,
    capacity: usize,
}

impl ArrivalWindow {
    fn new(capacity: usize, first_gap: Duration, now: Instant) -> Self {
        let mut gaps_ms = VecDeque::with_capacity(capacity.min(64));
        gaps_ms.push_back(first_gap.as_secs_f64() * 1_000.0);
        Self {
            gaps_ms,
            last_arrival: now,
            capacity,
        }
    }

    fn record(&mut self, now: Instant) {
        let gap_ms = now
            .saturating_duration_since(self.last_arrival)
            .as_secs_f64()
            * 1_000.0;
        if self.gaps_ms.len() == self.capacity {
            self.gaps_ms.pop_front();
        }
        self.gaps_ms.push_back(gap_ms);
        self.last_arrival = now;
    }

    fn mean_ms(&self) -> f64 {
        let sum: f64 = self.gaps_ms.iter().sum();
        (sum / self.gaps_ms.len() as f64).max(MIN_MEAN_MS)
    }

    fn phi(&self, now: Instant) -> f64 {
        let elapsed_ms = now
            .saturating_duration_since(self.last_arrival)
            .as_secs_f64()
            * 1_000.0;
        elapsed_ms / self.mean_ms() * LOG10_E
    }
}

/// Phi-accrual failure detector over all known peers.
///
/// The caller (the gossip executor) reports heartbeat advances via
/// [`notify_heartbeat`] and polls [`suspicion`] against its configured
/// threshold each period.
///
/// [`notify_heartbeat`]: FailureDetector::notify_heartbeat
/// [`suspicion`]: FailureDetector::suspicion
#[derive(Debug)]
pub struct FailureDetector {
    windows: HashMap<NodeId, ArrivalWindow>,
    window_size: usize,
    first_gap: Duration,
}

impl FailureDetector {
    /// Create a detector keeping `window_size` gaps per peer; fresh
    /// windows are seeded with `first_gap` so the first reading is
    /// meaningful.
    pub fn new(window_size: usize, first_gap: Duration) -> Self {
        Self {
            windows: HashMap::new(),
            window_size: window_size.max(1),
            first_gap,
        }
    }

    /// Record a heartbeat advance for `node` at `now`.
    pub fn notify_heartbeat(&mut self, node: NodeId, now: Instant) {
        match self.windows.get_mut(&node) {
            Some(window) => window.record(now),
            None => {
                self.windows.insert(
                    node,
                    ArrivalWindow::new(self.window_size, self.first_gap, now),
                );
            }
        }
    }

    /// Current suspicion score for `node`; `0.0` for a peer that has
    /// never produced a heartbeat (nothing to suspect yet).
    pub fn suspicion(&self, node: &NodeId, now: Instant) -> f64 {
        self.windows
            .get(node)
            .map(|window| window.phi(now))
            .unwrap_or(0.0)
    }

    /// Number of peers with an arrival history.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
