use std::{hash::Hash, time::Instant};

use log::{debug, info, warn};

use dewdrop_shared::{
    breadth_first, outranks, DespawnNodes, GameWorld, HostClaim, LastSeen, MessageIndex,
    NodeDelta, NodeId, NodeKind, Payload, PeerId, SceneSnapshot, SequenceTracker, SpawnKey,
    SpawnRequest, StateSnapshot, SyncError, SyncNode, SyncNodes, Timer,
};

use crate::{
    error::PeerError,
    outbox::Destination,
    session::{SessionState, SyncOrchestrator},
};

/// The latest lastSeen report of one client.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct SnapshotReport {
    index: Option<MessageIndex>,
    /// Consecutive reports of `index` while the host had sent a newer one
    stalled: u32,
}

impl<E: Copy + Eq + Hash> SyncOrchestrator<E> {
    pub(super) fn host_claim(&self) -> Payload {
        Payload::HostChange(HostClaim {
            id_floor: self.registry.id_floor(),
        })
    }

    pub(super) fn become_host<W: GameWorld<E>>(&mut self, world: &mut W, now: Instant) {
        let local = self.local_peer.clone();
        info!("SyncOrchestrator: {} is now the session host", local);

        let migrated = !self.registry.is_empty();
        self.host = Some(local.clone());
        self.state = SessionState::HostActive;
        self.registry.set_authority(true);
        self.last_seen_timer = None;
        self.last_received_snapshot = None;
        self.sync_request_pending = false;

        if let Some(previous) = self.previous_host.take() {
            if previous != local {
                self.registry.transfer_ownership(&previous, &local);
            }
        }
        if migrated {
            self.registry.clear_snapshots();
        }
        if let Err(error) = self.register_scene(world) {
            self.report(error);
            if !self.state.is_host() {
                return;
            }
        }

        self.broadcast_timer = Some(Timer::new(self.config.broadcast_interval, now));
        self.events.push_host_change(&local);

        // hostChange must be the first reliable message of this host
        self.send_reliable(Destination::All, self.host_claim(), now);
        self.send_scene_sync(world, Destination::All, now);

        for (key, kind) in self.spawn_requests.drain_pending() {
            if self.spawn_ledger.get(&key).is_some() {
                continue;
            }
            if let Err(error) = self.spawn_for(world, kind, key, now) {
                self.report(error);
            }
        }
    }

    /// Registers every scene node that has no id yet.
    fn register_scene<W: GameWorld<E>>(&mut self, world: &W) -> Result<(), PeerError> {
        let root = world.scene_root().ok_or(SyncError::MissingScene)?;
        for handle in self.scene_traversal(world, &root) {
            if self.registry.node_id(&handle).is_none() {
                self.registry.register(handle, self.local_peer.clone())?;
            }
        }
        Ok(())
    }

    /// Sends the scene's ids, then replays every recorded spawn.
    pub(super) fn send_scene_sync<W: GameWorld<E>>(
        &mut self,
        world: &W,
        destination: Destination,
        now: Instant,
    ) {
        if let Err(error) = self.register_scene(world) {
            self.report(error);
            return;
        }
        let Some(root) = world.scene_root() else {
            return;
        };

        let mut nodes = Vec::new();
        for handle in self.scene_traversal(world, &root) {
            let Some(id) = self.registry.node_id(&handle) else {
                continue;
            };
            nodes.push(SyncNode {
                id,
                spawn: false,
                kind: world.node_kind(&handle).unwrap_or(NodeKind::Node),
            });
        }
        debug!(
            "SyncOrchestrator: scene sync of {} nodes to {:?}",
            nodes.len(),
            destination
        );
        self.send_reliable(
            destination.clone(),
            Payload::SyncNodes(SyncNodes {
                nodes,
                source_peer: None,
                spawn_key: None,
            }),
            now,
        );

        let spawns: Vec<SyncNodes> = self.spawn_ledger.iter().cloned().collect();
        for sync in spawns {
            self.send_reliable(destination.clone(), Payload::SyncNodes(sync), now);
        }
    }

    pub(super) fn welcome_peer<W: GameWorld<E>>(&mut self, world: &W, peer: &PeerId, now: Instant) {
        info!("SyncOrchestrator: sending session state to {}", peer);

        self.send_reliable(Destination::Peer(peer.clone()), self.host_claim(), now);
        self.send_scene_sync(world, Destination::Peer(peer.clone()), now);
        self.registry.clear_snapshots();
    }

    pub(super) fn on_host_change<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        claimant: PeerId,
        claim: HostClaim,
        now: Instant,
    ) {
        let floor = self.registry.id_floor();
        if !self.state.is_host() {
            match self.host.clone() {
                Some(host) if host == claimant => {}
                Some(host) if !outranks(&claimant, &claim, &host, floor) => {
                    info!(
                        "SyncOrchestrator: ignoring host claim from {}, staying with {}",
                        claimant, host
                    );
                    self.contested.insert(claimant);
                }
                _ => self.follow_host(claimant, now),
            }
            return;
        }

        if outranks(&claimant, &claim, &self.local_peer, floor) {
            info!("SyncOrchestrator: conceding host role to {}", claimant);
            self.follow_host(claimant, now);
        } else {
            info!("SyncOrchestrator: rejecting host claim from {}", claimant);
            self.contested.insert(claimant);
            self.send_reliable(Destination::All, self.host_claim(), now);
            self.send_scene_sync(world, Destination::All, now);
            self.registry.clear_snapshots();
        }
    }

    pub(super) fn host_tick<W: GameWorld<E>>(&mut self, world: &W, now: Instant) {
        let Some(timer) = self.broadcast_timer.as_mut() else {
            return;
        };
        if !timer.poll(now) {
            return;
        }

        let mut deltas = Vec::new();
        let mut gone = Vec::new();
        for id in self.registry.ids() {
            let Some(node) = self.registry.get_mut(&id) else {
                continue;
            };
            let Some(current) = StateSnapshot::capture(world, &node.handle) else {
                gone.push((id, node.handle));
                continue;
            };

            let delta = NodeDelta::diff(id, node.last_snapshot.as_ref(), &current, &self.config.diff);
            match node.last_snapshot.as_mut() {
                // only what was sent counts as seen, so sub-tolerance drift accumulates
                Some(last) => delta.apply_to_snapshot(last),
                None => node.last_snapshot = Some(current),
            }
            if !delta.is_empty() {
                deltas.push(delta);
            }
        }

        if !gone.is_empty() {
            let ids: Vec<NodeId> = gone.iter().map(|(id, _)| *id).collect();
            info!("SyncOrchestrator: despawning {} nodes", ids.len());
            for (id, handle) in gone {
                self.registry.unregister(&id);
                self.events.push_despawn(id, handle);
            }
            self.spawn_ledger.forget_roots(&ids);
            self.send_reliable(Destination::All, Payload::DespawnNodes(DespawnNodes { ids }), now);
        }

        if !deltas.is_empty() && !self.peers.is_empty() {
            let index = self.send_unreliable(
                Destination::All,
                Payload::SceneSnapshot(SceneSnapshot { nodes: deltas }),
                now,
            );
            if index.is_some() {
                self.last_sent_snapshot = index;
            }
        }
    }

    pub(super) fn handle_spawn_request<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        sender: &PeerId,
        request: SpawnRequest,
        now: Instant,
    ) {
        if request.requester() != sender {
            warn!(
                "SyncOrchestrator: {} sent a spawn request keyed for {}",
                sender,
                request.requester()
            );
        }

        if let Some(sync) = self.spawn_ledger.get(&request.key).cloned() {
            debug!(
                "SyncOrchestrator: duplicate spawn request {:?}, resending answer",
                request.key
            );
            self.send_reliable(Destination::Peer(sender.clone()), Payload::SyncNodes(sync), now);
            return;
        }

        if let Err(error) = self.spawn_for(world, request.kind, request.key, now) {
            self.report(error);
        }
    }

    /// Instantiates `kind` under the scene root, registers its hierarchy
    /// breadth-first and announces it to every peer.
    pub(super) fn spawn_for<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        kind: NodeKind,
        key: SpawnKey,
        now: Instant,
    ) -> Result<(), PeerError> {
        self.register_scene(world)?;
        let root = world.scene_root().ok_or(SyncError::MissingScene)?;
        let parent_id = self
            .registry
            .node_id(&root)
            .ok_or(SyncError::MissingScene)?;

        let node = world
            .instantiate(kind)
            .ok_or(SyncError::InstantiateFailed { kind })?;
        world.attach(&node, &root);

        let mut nodes = vec![SyncNode {
            id: parent_id,
            spawn: false,
            kind: world.node_kind(&root).unwrap_or(NodeKind::Scene),
        }];
        for (index, handle) in breadth_first(world, &node).into_iter().enumerate() {
            match self.registry.register(handle, key.requester.clone()) {
                Ok(id) => nodes.push(SyncNode {
                    id,
                    spawn: index == 0,
                    kind: world.node_kind(&handle).unwrap_or(NodeKind::Node),
                }),
                Err(error) => {
                    for registered in &nodes[1..] {
                        self.registry.unregister(&registered.id);
                    }
                    world.despawn(&node);
                    return Err(error.into());
                }
            }
        }

        let Some(root_id) = nodes.get(1).map(|spawned| spawned.id) else {
            world.despawn(&node);
            return Err(SyncError::InstantiateFailed { kind }.into());
        };
        let sync = SyncNodes {
            nodes,
            source_peer: Some(key.requester.clone()),
            spawn_key: Some(key.clone()),
        };
        info!(
            "SyncOrchestrator: spawned {:?} {} for {}",
            kind, root_id, key.requester
        );

        self.spawn_requests.resolve(&key);
        self.spawn_ledger.insert(key.clone(), sync.clone());
        self.events
            .push_spawn(Some(key.requester.clone()), root_id, node);
        self.send_reliable(Destination::All, Payload::SyncNodes(sync), now);
        Ok(())
    }

    pub(super) fn handle_last_seen(&mut self, sender: &PeerId, last_seen: LastSeen, now: Instant) {
        let index = last_seen.snapshot_index;
        let previous = self.reported_snapshots.get(sender).copied().unwrap_or_default();

        let Some(current) = self.last_sent_snapshot else {
            self.reported_snapshots
                .insert(sender.clone(), SnapshotReport { index, stalled: 0 });
            return;
        };
        let lag = index.map(|seen| SequenceTracker::index_lag(seen, current));
        let stalled = match lag {
            Some(0) => 0,
            _ if previous.index == index => previous.stalled + 1,
            _ => 1,
        };
        self.reported_snapshots
            .insert(sender.clone(), SnapshotReport { index, stalled });

        let lagging = lag.map_or(false, |lag| lag > self.config.max_snapshot_lag);
        if !lagging && stalled < self.config.max_stalled_reports {
            return;
        }
        if let Some(last_resync) = self.last_resync {
            if now.saturating_duration_since(last_resync) < self.config.resync_cooldown {
                return;
            }
        }

        match lag {
            Some(lag) => info!(
                "SyncOrchestrator: {} is {} snapshots behind, resending full state",
                sender, lag
            ),
            None => info!(
                "SyncOrchestrator: {} has no snapshot yet, resending full state",
                sender
            ),
        }
        self.last_resync = Some(now);
        self.registry.clear_snapshots();
        for report in self.reported_snapshots.values_mut() {
            report.stalled = 0;
        }
    }

    pub(super) fn handle_sync_request<W: GameWorld<E>>(&mut self, world: &W, sender: &PeerId, now: Instant) {
        info!("SyncOrchestrator: {} requested a full sync", sender);

        self.send_scene_sync(world, Destination::Peer(sender.clone()), now);
        self.registry.clear_snapshots();
    }
}
