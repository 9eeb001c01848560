//! Per-node gossip state: heartbeat, application state, node state.
//!
//! Every version number attached to a node's state (the heartbeat's own
//! version and the version of every application-state cell) is drawn from
//! that node's single monotonic counter, so "the greatest version in this
//! node state" is a well-defined quantity and drives digest reconciliation.

use std::{collections::HashMap, time::Instant};

// ── Heartbeat ───────────────────────────────────────────────────────────────

/// One node's incarnation marker plus its mutation counter.
///
/// `generation` is assigned at process start and never decreases for a
/// given node; a larger generation signals a restart.  `version` increases
/// on every local state change within a generation.  The derived ordering
/// is lexicographic: generation first, then version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Heartbeat {
    /// Process incarnation, e.g. wall-clock seconds at boot.
    pub generation: u64,
    /// Mutation counter within this generation.
    pub version: u64,
}

impl Heartbeat {
    /// The never-seen heartbeat, used for nodes known only by name.
    pub const ZERO: Heartbeat = Heartbeat {
        generation: 0,
        version: 0,
    };

    /// Start a new incarnation.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            version: 1,
        }
    }
}

// ── Application state keys ──────────────────────────────────────────────────

/// Key of one application-state cell.
///
/// The known keys mirror what the database layers publish about a node.
/// Codes from newer software that this build does not know are carried in
/// `Other` instead of being dropped, so they keep gossiping through mixed
/// clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    /// Ring status (joining, normal, leaving, removed).
    Status,
    /// Load factor published for balancing decisions.
    Load,
    /// Schema fingerprint of the node's metadata.
    Schema,
    /// Datacenter name.
    Dc,
    /// Rack name.
    Rack,
    /// Software release version string.
    ReleaseVersion,
    /// Stable storage host id.
    HostId,
    /// Backpressure severity hint.
    Severity,
    /// A key defined by a newer protocol line.
    Other(u8),
}

impl StateKey {
    /// One-byte wire code.
    pub fn code(self) -> u8 {
        match self {
            StateKey::Status => 0,
            StateKey::Load => 1,
            StateKey::Schema => 2,
            StateKey::Dc => 3,
            StateKey::Rack => 4,
            StateKey::ReleaseVersion => 5,
            StateKey::HostId => 6,
            StateKey::Severity => 7,
            StateKey::Other(code) => code,
        }
    }

    /// Decode a wire code; unknown codes land in [`StateKey::Other`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => StateKey::Status,
            1 => StateKey::Load,
            2 => StateKey::Schema,
            3 => StateKey::Dc,
            4 => StateKey::Rack,
            5 => StateKey::ReleaseVersion,
            6 => StateKey::HostId,
            7 => StateKey::Severity,
            other => StateKey::Other(other),
        }
    }
}

// ── Application state ───────────────────────────────────────────────────────

/// One application-state cell: opaque value bytes stamped with the version
/// at which the owning node wrote them.
///
/// Values that participate in MVCC hold `VersionedValueCodec` encodings;
/// gossip itself treats them as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBytes {
    /// Opaque value bytes.
    pub value: Vec<u8>,
    /// Version drawn from the owning node's heartbeat counter.
    pub version: u64,
}

impl VersionedBytes {
    /// Build a cell.
    pub fn new(value: Vec<u8>, version: u64) -> Self {
        Self { value, version }
    }
}

/// Key → versioned-cell map for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationState {
    cells: HashMap<StateKey, VersionedBytes>,
}

impl ApplicationState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one cell.
    pub fn get(&self, key: StateKey) -> Option<&VersionedBytes> {
        self.cells.get(&key)
    }

    /// Insert or replace one cell.
    pub fn set(&mut self, key: StateKey, cell: VersionedBytes) {
        self.cells.insert(key, cell);
    }

    /// Iterate over all cells.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &VersionedBytes)> {
        self.cells.iter()
    }

    /// Keys of all cells.
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.cells.keys()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is present.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Greatest version across all cells, `0` when empty.
    pub fn max_version(&self) -> u64 {
        self.cells.values().map(|c| c.version).max().unwrap_or(0)
    }
}

// ── Node state ──────────────────────────────────────────────────────────────

/// Everything the local table knows about one node.
///
/// Owned exclusively by the endpoint state table; `is_alive` and
/// `last_seen` are local judgements and never travel on the wire.
#[derive(Debug, Clone)]
pub struct NodeState {
    /// The node's incarnation and mutation counter.
    pub heartbeat: Heartbeat,
    /// The node's application-state cells.
    pub app: ApplicationState,
    /// Local liveness verdict from the failure detector.
    pub is_alive: bool,
    /// Monotonic instant of the last heartbeat advance observed here.
    pub last_seen: Instant,
}

impl NodeState {
    /// Fresh state for a node with a known heartbeat.
    pub fn new(heartbeat: Heartbeat, now: Instant) -> Self {
        Self {
            heartbeat,
            app: ApplicationState::new(),
            is_alive: false,
            last_seen: now,
        }
    }

    /// State rebuilt from wire data (decoder entry point).
    pub fn with_app(heartbeat: Heartbeat, app: ApplicationState, now: Instant) -> Self {
        Self {
            heartbeat,
            app,
            is_alive: false,
            last_seen: now,
        }
    }

    /// Greatest version across the heartbeat and every cell.
    pub fn max_version(&self) -> u64 {
        self.heartbeat.version.max(self.app.max_version())
    }

    /// Whether two states carry the same gossip-visible content,
    /// ignoring the local-only liveness fields.
    pub fn same_content(&self, other: &NodeState) -> bool {
        self.heartbeat == other.heartbeat && self.app == other.app
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
