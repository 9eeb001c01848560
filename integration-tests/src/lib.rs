//! Meridian Integration Tests
//!
//! End-to-end coverage of the cluster membership engine and the storage
//! codec it shares wire bytes with:
//!
//! 1. **Gossip exchanges** — fresh join, restart, partial delta, unknown
//!    node, each run through real encoded packets.
//! 2. **Convergence** — random pairwise rounds drive every table to the
//!    element-wise maximum of all initial tables.
//! 3. **Live cluster** — threaded gossipers over the loopback hub:
//!    discovery, state dissemination, death detection.
//! 4. **Codec compatibility** — MVCC versioned-value bytes carried as
//!    gossip application state decode identically on the far side.
//!
//! The harness does NOT open sockets; nodes exchange encoded frames
//! in-process, which keeps every scenario deterministic.

pub mod harness;


#[cfg(test)]
mod codec_tests;
