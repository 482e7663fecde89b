use std::{
    collections::{BTreeSet, HashMap, HashSet},
    hash::Hash,
    mem,
    time::Instant,
};

use log::{debug, error, info, trace, warn};

use dewdrop_shared::{
    breadth_first_excluding, elect_host, Envelope, GameWorld, MessageIndex, MessageKind,
    NodeKind, NodeRegistry, Payload, PeerConnectionState, PeerId, PlayerInput, RegistryError,
    Reliability, SequenceTracker, SpawnKey, SpawnRequest, SyncError, Timer, Transport, TransportError,
};

use crate::{
    activity_tracker::ActivityTracker,
    error::{AbortReason, PeerError},
    events::Events,
    outbox::{Destination, ReliableOutbox},
    session::{host::SnapshotReport, SessionConfig, SessionState, ViolationPolicy},
    spawn_requests::{SpawnLedger, SpawnRequestTracker},
    transport::{TransportEvent, TransportHandle, TransportInbox},
};

/// Drives one peer's side of a session: elects the host, keeps the node
/// registry in step with the host, and broadcasts or applies state.
///
/// Nothing happens on its own. Call
/// [`receive_all_messages`](SyncOrchestrator::receive_all_messages) and
/// [`send_all_updates`](SyncOrchestrator::send_all_updates) from the game
/// loop, passing the game world each time.
pub struct SyncOrchestrator<E: Copy + Eq + Hash> {
    pub(super) config: SessionConfig,
    pub(super) local_peer: PeerId,
    pub(super) transport: Box<dyn Transport>,
    handle: TransportHandle,
    inbox: TransportInbox,
    pub(super) state: SessionState,
    pub(super) host: Option<PeerId>,
    pub(super) previous_host: Option<PeerId>,
    pub(super) peers: BTreeSet<PeerId>,
    /// Peers whose host claim was rejected
    pub(super) contested: HashSet<PeerId>,
    ended: bool,
    pub(super) sequence: SequenceTracker,
    pub(super) registry: NodeRegistry<E>,
    pub(super) outbox: ReliableOutbox,
    pub(super) spawn_requests: SpawnRequestTracker,
    pub(super) spawn_ledger: SpawnLedger,
    pub(super) broadcast_timer: Option<Timer>,
    pub(super) last_seen_timer: Option<Timer>,
    pub(super) last_sent_snapshot: Option<MessageIndex>,
    pub(super) last_received_snapshot: Option<MessageIndex>,
    pub(super) reported_snapshots: HashMap<PeerId, SnapshotReport>,
    pub(super) last_resync: Option<Instant>,
    pub(super) sync_request_pending: bool,
    pub(super) activity: ActivityTracker,
    pub(super) events: Events<E>,
}

impl<E: Copy + Eq + Hash> SyncOrchestrator<E> {
    /// Create a new session for `local_peer`. Wire the transport's inbound
    /// callbacks to [`transport_handle`](SyncOrchestrator::transport_handle).
    pub fn new(config: SessionConfig, local_peer: PeerId, transport: Box<dyn Transport>) -> Self {
        let (handle, inbox) = TransportInbox::unbounded();
        let outbox = ReliableOutbox::new(config.retry.clone());
        let spawn_requests = SpawnRequestTracker::new(config.spawn_retry.clone());

        Self {
            config,
            local_peer,
            transport,
            handle,
            inbox,
            state: SessionState::Disconnected,
            host: None,
            previous_host: None,
            peers: BTreeSet::new(),
            contested: HashSet::new(),
            ended: false,
            sequence: SequenceTracker::new(),
            registry: NodeRegistry::new(),
            outbox,
            spawn_requests,
            spawn_ledger: SpawnLedger::new(),
            broadcast_timer: None,
            last_seen_timer: None,
            last_sent_snapshot: None,
            last_received_snapshot: None,
            reported_snapshots: HashMap::new(),
            last_resync: None,
            sync_request_pending: false,
            activity: ActivityTracker::new(),
            events: Events::new(),
        }
    }

    pub fn transport_handle(&self) -> TransportHandle {
        self.handle.clone()
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.local_peer
    }

    pub fn host(&self) -> Option<&PeerId> {
        self.host.as_ref()
    }

    pub fn is_host(&self) -> bool {
        self.state.is_host()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connected remote peers, in id order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.peers.iter().cloned().collect()
    }

    pub fn registry(&self) -> &NodeRegistry<E> {
        &self.registry
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn take_events(&mut self) -> Events<E> {
        mem::take(&mut self.events)
    }

    /// Drains every transport event queued since the last call and applies
    /// it to the session and to `world`.
    pub fn receive_all_messages<W: GameWorld<E>>(&mut self, world: &mut W, now: Instant) {
        while let Some(event) = self.inbox.try_recv() {
            match event {
                TransportEvent::PeersEstablished { peers } => {
                    self.on_peers_established(world, peers, now);
                }
                TransportEvent::PeerConnection { peer, state } => {
                    if !self.ended {
                        self.on_peer_connection(world, peer, state, now);
                    }
                }
                TransportEvent::Received { from, bytes } => {
                    if !self.ended {
                        self.on_receive(world, from, &bytes, now);
                    }
                }
            }
        }

        self.flush_outbox(now);
    }

    /// Runs the timers: the host's broadcast tick, a client's lastSeen
    /// report and spawn-request retries, and reliable resends. If you don't
    /// call this method, the session never sends state.
    pub fn send_all_updates<W: GameWorld<E>>(&mut self, world: &W, now: Instant) {
        if self.ended {
            return;
        }

        match self.state {
            SessionState::HostActive => self.host_tick(world, now),
            SessionState::ClientAwaitingSync | SessionState::ClientActive => self.client_tick(now),
            SessionState::Disconnected | SessionState::ElectingHost => {}
        }

        self.flush_outbox(now);
    }

    /// Asks the host to spawn an object of `kind`. On the host itself the
    /// object is spawned immediately.
    pub fn request_spawn<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        kind: NodeKind,
        now: Instant,
    ) -> Result<SpawnKey, PeerError> {
        if !kind.is_spawnable() {
            return Err(SyncError::InstantiateFailed { kind }.into());
        }
        let Some(host) = self.host.clone() else {
            return Err(PeerError::NoHost);
        };

        let key = self.spawn_requests.next_key(&self.local_peer);
        if host == self.local_peer {
            self.spawn_for(world, kind, key.clone(), now)?;
        } else {
            debug!("SyncOrchestrator: requesting {:?} spawn from {}", kind, host);
            self.spawn_requests.track(key.clone(), kind, now);
            self.send_reliable(
                Destination::Peer(host),
                Payload::SpawnRequest(SpawnRequest {
                    kind,
                    key: key.clone(),
                }),
                now,
            );
        }
        Ok(key)
    }

    /// Forwards local player input to the host. On the host it is surfaced
    /// directly as a `PlayerInputEvent`.
    pub fn send_player_input(&mut self, input: PlayerInput, now: Instant) -> Result<(), PeerError> {
        let Some(host) = self.host.clone() else {
            return Err(PeerError::NoHost);
        };

        if host == self.local_peer {
            let local = self.local_peer.clone();
            self.events.push_player_input(&local, input);
        } else {
            self.send_unreliable(Destination::Peer(host), Payload::PlayerUpdate(input), now);
        }
        Ok(())
    }

    /// Asks the host for a full scene sync. Ignored on the host, and while a
    /// previous request is unanswered.
    pub fn request_full_sync(&mut self, now: Instant) {
        let Some(host) = self.host.clone() else {
            return;
        };
        if host == self.local_peer || self.sync_request_pending {
            return;
        }

        info!("SyncOrchestrator: requesting full sync from {}", host);
        self.sync_request_pending = true;
        self.send_reliable(Destination::Peer(host), Payload::SyncRequest, now);
    }

    /// Cancels the timers and drops every piece of session state. Events
    /// not yet taken are kept.
    pub fn end_session(&mut self) {
        info!("SyncOrchestrator: ending session for {}", self.local_peer);

        self.state = SessionState::Disconnected;
        self.ended = true;
        self.host = None;
        self.previous_host = None;
        self.peers.clear();
        self.contested.clear();
        self.broadcast_timer = None;
        self.last_seen_timer = None;
        self.registry.clear();
        self.sequence.clear();
        self.outbox.clear();
        self.spawn_requests.clear();
        self.spawn_ledger.clear();
        self.last_sent_snapshot = None;
        self.last_received_snapshot = None;
        self.reported_snapshots.clear();
        self.last_resync = None;
        self.sync_request_pending = false;
    }

    // Transport events

    fn on_peers_established<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        peers: Vec<PeerId>,
        now: Instant,
    ) {
        self.ended = false;

        let mut joined = Vec::new();
        for peer in peers {
            if peer != self.local_peer && self.peers.insert(peer.clone()) {
                joined.push(peer);
            }
        }
        for peer in &joined {
            self.events.push_connection(peer);
        }

        match self.state {
            SessionState::Disconnected | SessionState::ElectingHost => {
                self.state = SessionState::ElectingHost;
                self.run_election(world, now);
            }
            SessionState::HostActive => {
                for peer in joined {
                    self.welcome_peer(world, &peer, now);
                }
            }
            SessionState::ClientAwaitingSync | SessionState::ClientActive => {}
        }
    }

    fn on_peer_connection<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        peer: PeerId,
        state: PeerConnectionState,
        now: Instant,
    ) {
        if peer == self.local_peer {
            return;
        }

        match state {
            PeerConnectionState::Connected => {
                if !self.peers.insert(peer.clone()) {
                    return;
                }
                info!("SyncOrchestrator: {} connected", peer);
                self.events.push_connection(&peer);
                if self.state.is_host() {
                    self.welcome_peer(world, &peer, now);
                }
            }
            PeerConnectionState::Disconnected => {
                if !self.peers.remove(&peer) {
                    return;
                }
                info!("SyncOrchestrator: {} disconnected", peer);
                self.events.push_disconnection(&peer);
                self.sequence.forget_peer(&peer);
                self.outbox.forget_peer(&peer);
                self.reported_snapshots.remove(&peer);
                self.contested.remove(&peer);
                if self.host.as_ref() == Some(&peer) {
                    self.on_host_lost(world, peer, now);
                }
            }
            PeerConnectionState::Unknown => {
                debug!("SyncOrchestrator: connection state of {} is unknown", peer);
            }
        }
    }

    fn on_host_lost<W: GameWorld<E>>(&mut self, world: &mut W, host: PeerId, now: Instant) {
        warn!("SyncOrchestrator: lost host {}, electing a new one", host);

        self.host = None;
        self.previous_host = Some(host);
        self.broadcast_timer = None;
        self.last_seen_timer = None;
        self.state = SessionState::ElectingHost;
        self.run_election(world, now);
    }

    fn run_election<W: GameWorld<E>>(&mut self, world: &mut W, now: Instant) {
        let mut candidates: Vec<PeerId> = self.peers.iter().cloned().collect();
        candidates.push(self.local_peer.clone());

        let hint = self.transport.suggest_host(&candidates);
        match elect_host(&candidates, hint.as_ref()) {
            Some(winner) if winner == self.local_peer => self.become_host(world, now),
            Some(winner) => self.follow_host(winner, now),
            None => {}
        }
    }

    fn on_receive<W: GameWorld<E>>(&mut self, world: &mut W, from: PeerId, bytes: &[u8], now: Instant) {
        self.activity.record_received(now, bytes.len());

        let envelope = match Envelope::decode(bytes) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(
                    "SyncOrchestrator: dropping undecodable message from {}: {}",
                    from, error
                );
                self.events.push_error(error.into());
                return;
            }
        };

        let kind = envelope.kind();
        let sender = envelope.metadata.sender.clone().unwrap_or(from);
        if sender == self.local_peer {
            return;
        }

        if !self.sequence.should_accept(
            &sender,
            kind,
            envelope.metadata.index,
            envelope.metadata.wrapped,
        ) {
            return;
        }

        if kind.is_host_only()
            && self.host.as_ref() != Some(&sender)
            && self.contested.contains(&sender)
        {
            debug!(
                "SyncOrchestrator: ignoring {:?} from contested host {}",
                kind, sender
            );
            return;
        }
        if let Some(reason) = self.role_violation(kind, &sender) {
            self.protocol_violation(kind, sender, reason);
            return;
        }

        trace!("SyncOrchestrator: {:?} from {}", kind, sender);
        match envelope.payload {
            Payload::HostChange(claim) => self.on_host_change(world, sender, claim, now),
            Payload::SceneSnapshot(snapshot) => {
                self.apply_scene_snapshot(world, envelope.metadata.index, snapshot)
            }
            Payload::SyncNodes(sync) => self.apply_sync_nodes(world, &sender, sync, now),
            Payload::SpawnRequest(request) => self.handle_spawn_request(world, &sender, request, now),
            Payload::LastSeen(last_seen) => self.handle_last_seen(&sender, last_seen, now),
            Payload::PlayerUpdate(input) => self.events.push_player_input(&sender, input),
            Payload::DespawnNodes(despawn) => self.apply_despawn(world, despawn),
            Payload::SyncRequest => self.handle_sync_request(world, &sender, now),
        }
    }

    fn role_violation(&self, kind: MessageKind, sender: &PeerId) -> Option<&'static str> {
        if kind.is_host_only() && self.host.as_ref() != Some(sender) {
            return Some("sender is not the session host");
        }
        if kind.is_host_bound() && !self.state.is_host() {
            return Some("only the host accepts this message");
        }
        None
    }

    pub(super) fn protocol_violation(&mut self, kind: MessageKind, from: PeerId, reason: &'static str) {
        match self.config.violation_policy {
            ViolationPolicy::Drop => {
                warn!(
                    "SyncOrchestrator: dropping {:?} from {}: {}",
                    kind, from, reason
                );
                self.events
                    .push_error(PeerError::ProtocolViolation { kind, from, reason });
            }
            ViolationPolicy::AbortSession => {
                error!(
                    "SyncOrchestrator: aborting session on {:?} from {}: {}",
                    kind, from, reason
                );
                self.abort(AbortReason::ProtocolViolation { kind, from, reason });
            }
        }
    }

    pub(super) fn abort(&mut self, reason: AbortReason) {
        self.end_session();
        self.events.push_abort(reason);
    }

    /// Surfaces a non-fatal error, or aborts when the host can no longer
    /// mint ids.
    pub(super) fn report(&mut self, error: PeerError) {
        if let PeerError::Registry(RegistryError::IdsExhausted { .. }) = error {
            self.abort(AbortReason::IdsExhausted);
            return;
        }
        warn!("SyncOrchestrator: {}", error);
        self.events.push_error(error);
    }

    // Traversal

    /// Breadth-first walk of the scene, leaving out spawned objects. Those
    /// are replayed from the spawn ledger instead.
    pub(super) fn scene_traversal<W: GameWorld<E>>(&self, world: &W, root: &E) -> Vec<E> {
        let spawned: HashSet<E> = self
            .spawn_ledger
            .roots()
            .filter_map(|id| self.registry.handle(&id))
            .collect();
        breadth_first_excluding(world, root, &spawned)
    }

    // Sending

    pub(super) fn send_reliable(&mut self, destination: Destination, payload: Payload, now: Instant) {
        self.outbox.push(destination, payload);
        self.flush_outbox(now);
    }

    pub(super) fn flush_outbox(&mut self, now: Instant) {
        let broadcast_recipients = self.peers.len();
        let Self {
            outbox,
            sequence,
            transport,
            local_peer,
            activity,
            ..
        } = self;

        let failures = outbox.flush(now, |destination, payload| {
            let (bytes, _) = stamp(sequence, local_peer, payload)?;
            let (result, recipients) = match destination {
                Destination::All => (
                    transport.broadcast(&bytes, Reliability::Reliable),
                    broadcast_recipients,
                ),
                Destination::Peer(peer) => (transport.send_reliable(&bytes, peer), 1),
            };
            if result.is_ok() {
                activity.record_sent(now, bytes.len(), recipients);
            }
            result
        });

        for failure in failures {
            self.events.push_error(PeerError::DeliveryFailed {
                kind: failure.kind,
                attempts: failure.attempts,
                source: failure.error,
            });
        }
    }

    /// Fire-and-forget send. Returns the index the envelope was stamped with
    /// if the transport accepted it.
    pub(super) fn send_unreliable(
        &mut self,
        destination: Destination,
        payload: Payload,
        now: Instant,
    ) -> Option<MessageIndex> {
        let kind = payload.kind();
        let (bytes, index) = match stamp(&mut self.sequence, &self.local_peer, &payload) {
            Ok(stamped) => stamped,
            Err(error) => {
                warn!("SyncOrchestrator: cannot encode {:?}: {}", kind, error);
                return None;
            }
        };

        let (result, recipients) = match &destination {
            Destination::All => (
                self.transport.broadcast(&bytes, Reliability::Unreliable),
                self.peers.len(),
            ),
            Destination::Peer(peer) => (self.transport.send_unreliable(&bytes, peer), 1),
        };

        match result {
            Ok(()) => {
                self.activity.record_sent(now, bytes.len(), recipients);
                Some(index)
            }
            Err(error) => {
                debug!("SyncOrchestrator: unreliable {:?} dropped: {}", kind, error);
                None
            }
        }
    }
}

fn stamp(
    sequence: &mut SequenceTracker,
    sender: &PeerId,
    payload: &Payload,
) -> Result<(Vec<u8>, MessageIndex), TransportError> {
    let (index, wrapped) = sequence.next_send_index(payload.kind());
    let bytes = Envelope::new(payload.clone(), index, wrapped, sender)
        .encode()
        .map_err(|error| TransportError::SendFailed {
            reason: error.to_string(),
        })?;
    Ok((bytes, index))
}
