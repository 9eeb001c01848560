//! The gossip executor service.
//!
//! A long-running service owning the endpoint state table.  It:
//!
//! 1. Ticks every gossip period: bumps the local heartbeat, snapshots and
//!    shuffles digests, and opens up to three rounds (live / unreachable /
//!    seed).
//! 2. Drains a bounded mailbox of decoded packets, local state writes,
//!    and listener subscriptions, in FIFO order.
//! 3. Drives the SYN → ACK → ACK2 exchange for both roles.
//! 4. Interprets the failure detector each period and publishes the
//!    liveness partition for concurrent readers.
//!
//! Everything that mutates the table happens on this one thread, so every
//! mutation is linearizable with respect to every other; I/O threads only
//! decode and enqueue.

use {
    crate::{
        clock::Clock,
        error::{ClusterNetError, Result},
        membership::{ClusterListener, Membership},
        packet::{Ack2Packet, AckPacket, GossipPacket, SynPacket, PROTOCOL_VERSION},
        stats::GossipStats,
        transport::{PacketIntake, TransportOut},
    },
    crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender},
    log::{debug, info, warn},
    meridian_gossip::{
        config::GossipConfig,
        detector::FailureDetector,
        digest::digest_list,
        node::NodeId,
        reconcile::{fulfill, reconcile},
        round::RoundTable,
        selector::select_peers,
        state::{NodeState, StateKey},
        table::EndpointStateTable,
    },
    std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread::{Builder, JoinHandle},
        time::{Duration, Instant, SystemTime, UNIX_EPOCH},
    },
};

/// Everything the executor mailbox can carry.
pub enum GossipEvent {
    /// A decoded packet from an I/O thread.
    Packet {
        /// Authenticated sender identity.
        from: NodeId,
        /// The decoded frame.
        packet: GossipPacket,
    },
    /// A local application-state write.
    LocalUpdate {
        /// Cell to write.
        key: StateKey,
        /// New value bytes.
        value: Vec<u8>,
    },
    /// A new membership listener.
    Subscribe(Box<dyn ClusterListener>),
    /// Stop the executor.
    Shutdown,
}

/// Handle to a running gossip executor.
///
/// Cheap accessors ([`membership`], [`stats`]) can be cloned out and used
/// from any thread; mutations go through the mailbox.
///
/// [`membership`]: Gossiper::membership
/// [`stats`]: Gossiper::stats
pub struct Gossiper {
    local: NodeId,
    tx: Sender<GossipEvent>,
    thread: Option<JoinHandle<()>>,
    membership: Membership,
    stats: Arc<GossipStats>,
    exit: Arc<AtomicBool>,
}

impl Gossiper {
    /// Start the executor thread.
    ///
    /// The generation is taken from the config override when present,
    /// otherwise derived from wall-clock seconds at boot.
    pub fn start(
        local: NodeId,
        config: GossipConfig,
        transport: Arc<dyn TransportOut>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (tx, rx) = bounded(config.mailbox_capacity.max(1));
        let membership = Membership::default();
        let stats = Arc::new(GossipStats::default());
        let exit = Arc::new(AtomicBool::new(false));

        let generation = config.generation.unwrap_or_else(clock_generation);
        info!("starting gossip for {local} at generation {generation}");

        let thread = Builder::new()
            .name("meridianGossip".to_string())
            .spawn({
                let membership = membership.clone();
                let stats = Arc::clone(&stats);
                let exit = Arc::clone(&exit);
                move || {
                    let mut executor = GossipExecutor::new(
                        local, generation, config, transport, clock, membership, stats, exit,
                    );
                    executor.run(rx);
                }
            })
            .map_err(ClusterNetError::Spawn)?;

        Ok(Self {
            local,
            tx,
            thread: Some(thread),
            membership,
            stats,
            exit,
        })
    }

    /// This node's identity.
    pub fn local_id(&self) -> NodeId {
        self.local
    }

    /// Inbound hand-off point for I/O threads.
    pub fn intake(&self) -> PacketIntake {
        PacketIntake::new(self.tx.clone(), Arc::clone(&self.stats), PROTOCOL_VERSION)
    }

    /// Read handle over the liveness partition.
    pub fn membership(&self) -> Membership {
        self.membership.clone()
    }

    /// Shared traffic counters.
    pub fn stats(&self) -> Arc<GossipStats> {
        Arc::clone(&self.stats)
    }

    /// Write one cell of the local application state.  The heartbeat
    /// version is bumped on the executor thread when the event drains.
    pub fn set_local_state(&self, key: StateKey, value: Vec<u8>) -> Result<()> {
        self.tx
            .send(GossipEvent::LocalUpdate { key, value })
            .map_err(|_| ClusterNetError::MailboxClosed)
    }

    /// Register a membership listener.  Callbacks run on the executor
    /// thread and must not block.
    pub fn subscribe(&self, listener: Box<dyn ClusterListener>) -> Result<()> {
        self.tx
            .send(GossipEvent::Subscribe(listener))
            .map_err(|_| ClusterNetError::MailboxClosed)
    }

    /// Stop the executor and wait for it to exit.
    pub fn shutdown(mut self) {
        self.exit.store(true, Ordering::Relaxed);
        let _ = self.tx.send(GossipEvent::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Gossiper {
    fn drop(&mut self) {
        self.exit.store(true, Ordering::Relaxed);
    }
}

fn clock_generation() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

// ── Executor ────────────────────────────────────────────────────────────────

struct GossipExecutor {
    local: NodeId,
    config: GossipConfig,
    transport: Arc<dyn TransportOut>,
    clock: Arc<dyn Clock>,
    table: EndpointStateTable,
    rounds: RoundTable,
    detector: FailureDetector,
    membership: Membership,
    listeners: Vec<Box<dyn ClusterListener>>,
    stats: Arc<GossipStats>,
    exit: Arc<AtomicBool>,
    rng: rand::rngs::ThreadRng,
}

impl GossipExecutor {
    #[allow(clippy::too_many_arguments)]
    fn new(
        local: NodeId,
        generation: u64,
        config: GossipConfig,
        transport: Arc<dyn TransportOut>,
        clock: Arc<dyn Clock>,
        membership: Membership,
        stats: Arc<GossipStats>,
        exit: Arc<AtomicBool>,
    ) -> Self {
        let now = clock.now();
        let table = EndpointStateTable::new(local, generation, now);
        let rounds = RoundTable::new(Duration::from_millis(config.round_timeout_ms.max(1)));
        let detector = FailureDetector::new(
            config.arrival_window_size,
            Duration::from_millis(config.first_gap_estimate_ms.max(1)),
        );
        membership.publish(HashSet::from([local]), HashSet::new());
        Self {
            local,
            config,
            transport,
            clock,
            table,
            rounds,
            detector,
            membership,
            listeners: Vec::new(),
            stats,
            exit,
            rng: rand::rng(),
        }
    }

    fn run(&mut self, rx: Receiver<GossipEvent>) {
        let interval = Duration::from_millis(self.config.gossip_interval_ms.max(1));
        let mut next_tick = self.clock.now();

        loop {
            if self.exit.load(Ordering::Relaxed) {
                break;
            }
            let now = self.clock.now();
            if now >= next_tick {
                self.tick(now);
                next_tick = now + interval;
            }

            let wait = next_tick.saturating_duration_since(self.clock.now());
            match rx.recv_timeout(wait) {
                Ok(GossipEvent::Shutdown) => break,
                Ok(event) => self.on_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("gossip executor for {} stopped", self.local);
    }

    // ── Period tick ─────────────────────────────────────────────────────

    fn tick(&mut self, now: Instant) {
        self.table.bump_heartbeat();
        let digests = digest_list(&self.table, &mut self.rng);

        let mut live = Vec::new();
        let mut unreachable = Vec::new();
        for (id, state) in self.table.iter() {
            if *id == self.local {
                continue;
            }
            if state.is_alive {
                live.push(*id);
            } else {
                unreachable.push(*id);
            }
        }

        let targets = select_peers(
            &live,
            &unreachable,
            &self.config.seeds,
            &self.local,
            &mut self.rng,
        );
        for peer in targets {
            self.rounds.begin(peer, now);
            GossipStats::inc(&self.stats.rounds_started);
            self.send(
                peer,
                &GossipPacket::Syn(SynPacket {
                    digests: digests.clone(),
                }),
            );
        }

        for peer in self.rounds.expire(now) {
            GossipStats::inc(&self.stats.rounds_expired);
            debug!("gossip round with {peer} expired");
        }

        self.sweep_liveness(now);
    }

    fn sweep_liveness(&mut self, now: Instant) {
        let threshold = self.config.phi_threshold;
        let suspects: Vec<NodeId> = self
            .table
            .iter()
            .filter(|(id, state)| **id != self.local && state.is_alive)
            .map(|(id, _)| *id)
            .filter(|id| self.detector.suspicion(id, now) > threshold)
            .collect();
        if suspects.is_empty() {
            return;
        }
        for node in &suspects {
            if self.table.set_alive(node, false) {
                warn!("marking {node} dead (suspicion above {threshold})");
            }
        }
        for node in suspects {
            self.notify(|listener| listener.on_dead(node));
        }
        self.publish_view();
    }

    // ── Mailbox events ──────────────────────────────────────────────────

    fn on_event(&mut self, event: GossipEvent) {
        match event {
            GossipEvent::Packet { from, packet } => {
                GossipStats::inc(&self.stats.packets_received);
                match packet {
                    GossipPacket::Syn(syn) => self.on_syn(from, syn),
                    GossipPacket::Ack(ack) => self.on_ack(from, ack),
                    GossipPacket::Ack2(ack2) => self.on_ack2(from, ack2),
                }
            }
            GossipEvent::LocalUpdate { key, value } => self.on_local_update(key, value),
            GossipEvent::Subscribe(listener) => self.listeners.push(listener),
            GossipEvent::Shutdown => {}
        }
    }

    /// SYN: mutate nothing, reconcile, answer with requests and offers.
    fn on_syn(&mut self, from: NodeId, syn: SynPacket) {
        let now = self.clock.now();
        self.rounds.open_responder(from, now);
        let reconciliation = reconcile(&self.table, &syn.digests);
        debug!(
            "syn from {from}: {} digests -> {} requests, {} deltas",
            syn.digests.len(),
            reconciliation.requests.len(),
            reconciliation.deltas.len()
        );
        self.send(
            from,
            &GossipPacket::Ack(AckPacket {
                digests: reconciliation.requests,
                states: reconciliation.deltas,
            }),
        );
    }

    /// ACK: merge the offers, answer the requests from the merged table.
    fn on_ack(&mut self, from: NodeId, ack: AckPacket) {
        if self.rounds.accept_ack(&from).is_none() {
            GossipStats::inc(&self.stats.stale_dropped);
            debug!("stale ack from {from} dropped");
            return;
        }
        let now = self.clock.now();
        self.merge(ack.states, now);
        let answers = fulfill(&self.table, &ack.digests);
        self.send(from, &GossipPacket::Ack2(Ack2Packet { states: answers }));
        GossipStats::inc(&self.stats.rounds_completed);
    }

    /// ACK2: merge the closing deltas.
    fn on_ack2(&mut self, from: NodeId, ack2: Ack2Packet) {
        if self.rounds.accept_ack2(&from).is_none() {
            GossipStats::inc(&self.stats.stale_dropped);
            debug!("stale ack2 from {from} dropped");
            return;
        }
        let now = self.clock.now();
        self.merge(ack2.states, now);
        GossipStats::inc(&self.stats.rounds_completed);
    }

    fn on_local_update(&mut self, key: StateKey, value: Vec<u8>) {
        let local = self.local;
        match self.table.bump_local(&local, key, value.clone()) {
            Ok(version) => {
                debug!("local state {key:?} written at version {version}");
                self.notify(|listener| listener.on_change(local, key, &value));
            }
            Err(err) => warn!("local state write rejected: {err}"),
        }
    }

    // ── Merging and fulfilment ──────────────────────────────────────────

    fn merge(&mut self, states: Vec<(NodeId, NodeState)>, now: Instant) {
        let mut liveness_changed = false;
        for (node, state) in states {
            let outcome = self.table.apply_remote(node, state, now);
            if outcome.heartbeat_advanced {
                self.detector.notify_heartbeat(node, now);
            }
            if outcome.joined {
                info!("discovered node {node} via gossip");
                liveness_changed = true;
                self.notify(|listener| listener.on_join(node));
            }
            if outcome.restarted {
                debug!("node {node} restarted with a newer generation");
            }
            if outcome.revived {
                info!("node {node} is alive again");
                liveness_changed = true;
                self.notify(|listener| listener.on_alive(node));
            }
            for (changed_node, key) in outcome.changed {
                let value = self
                    .table
                    .get(&changed_node)
                    .and_then(|state| state.app.get(key))
                    .map(|cell| cell.value.clone());
                if let Some(value) = value {
                    self.notify(|listener| listener.on_change(changed_node, key, &value));
                }
            }
        }
        if liveness_changed {
            self.publish_view();
        }
    }

    // ── Plumbing ────────────────────────────────────────────────────────

    fn send(&self, peer: NodeId, packet: &GossipPacket) {
        let bytes = packet.encode(PROTOCOL_VERSION);
        match self.transport.send(&peer, &bytes) {
            Ok(()) => GossipStats::inc(&self.stats.packets_sent),
            Err(err) => {
                GossipStats::inc(&self.stats.send_failures);
                debug!("gossip {} to {peer} failed: {err}", packet.kind());
            }
        }
    }

    fn notify<F: FnMut(&mut dyn ClusterListener)>(&mut self, mut f: F) {
        for listener in &mut self.listeners {
            f(listener.as_mut());
        }
    }

    fn publish_view(&self) {
        let mut live = HashSet::new();
        let mut dead = HashSet::new();
        for (id, state) in self.table.iter() {
            if state.is_alive || *id == self.local {
                live.insert(*id);
            } else {
                dead.insert(*id);
            }
        }
        self.membership.publish(live, dead);
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{clock::SystemClock, transport::LoopbackNetwork},
        parking_lot::Mutex,
        std::time::Duration,
    };

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl ClusterListener for Recorder {
        fn on_join(&mut self, node: NodeId) {
            self.events.lock().push(format!("join:{node}"));
        }
        fn on_dead(&mut self, node: NodeId) {
            self.events.lock().push(format!("dead:{node}"));
        }
        fn on_change(&mut self, node: NodeId, key: StateKey, _value: &[u8]) {
            self.events.lock().push(format!("change:{node}:{key:?}"));
        }
    }

    fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn start_node(
        network: &Arc<LoopbackNetwork>,
        seeds: Vec<NodeId>,
    ) -> Gossiper {
        let local = NodeId::random();
        let mut config = GossipConfig::dev_default();
        config.seeds = seeds;
        let gossiper = Gossiper::start(
            local,
            config,
            network.transport(local),
            Arc::new(SystemClock),
        )
        .expect("gossiper starts");
        network.register(local, gossiper.intake());
        gossiper
    }

    #[test]
    fn test_two_nodes_discover_each_other() {
        let network = LoopbackNetwork::new();
        let seed = start_node(&network, vec![]);
        let joiner = start_node(&network, vec![seed.local_id()]);

        let converged = wait_until(Duration::from_secs(10), || {
            seed.membership().is_live(&joiner.local_id())
                && joiner.membership().is_live(&seed.local_id())
        });
        assert!(converged, "nodes failed to discover each other");

        assert!(seed.stats().snapshot().packets_received > 0);
        joiner.shutdown();
        seed.shutdown();
    }

    #[test]
    fn test_local_state_disseminates() {
        let network = LoopbackNetwork::new();
        let seed = start_node(&network, vec![]);
        let joiner = start_node(&network, vec![seed.local_id()]);

        let recorder = Recorder::default();
        let events = Arc::clone(&recorder.events);
        seed.subscribe(Box::new(recorder)).unwrap();

        joiner
            .set_local_state(StateKey::Load, b"0.42".to_vec())
            .unwrap();

        let joiner_id = joiner.local_id();
        let seen = wait_until(Duration::from_secs(10), || {
            events
                .lock()
                .iter()
                .any(|event| *event == format!("change:{joiner_id}:Load"))
        });
        assert!(seen, "seed never observed the joiner's state change");

        joiner.shutdown();
        seed.shutdown();
    }

    #[test]
    fn test_silent_node_is_marked_dead() {
        let network = LoopbackNetwork::new();
        let seed = start_node(&network, vec![]);
        let joiner = start_node(&network, vec![seed.local_id()]);
        let joiner_id = joiner.local_id();

        assert!(wait_until(Duration::from_secs(10), || {
            seed.membership().is_live(&joiner_id)
        }));

        // take the joiner off the network entirely
        network.unregister(&joiner_id);
        joiner.shutdown();

        let declared_dead = wait_until(Duration::from_secs(10), || {
            seed.membership().dead_nodes().contains(&joiner_id)
        });
        assert!(declared_dead, "silent node never marked dead");
        seed.shutdown();
    }

    #[test]
    fn test_shutdown_stops_executor() {
        let network = LoopbackNetwork::new();
        let node = start_node(&network, vec![]);
        let stats = node.stats();
        node.shutdown();
        let after = stats.snapshot();
        std::thread::sleep(Duration::from_millis(60));
        // no more ticks once the executor has exited
        assert_eq!(stats.snapshot().rounds_started, after.rounds_started);
    }
}
