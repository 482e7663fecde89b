use std::{hash::Hash, time::Instant};

use log::{debug, info, warn};

use dewdrop_shared::{
    breadth_first, DespawnNodes, GameWorld, LastSeen, MessageIndex, NodeKind, Payload, PeerId,
    SceneSnapshot, SpawnRequest, SyncError, SyncNodes, Timer,
};

use crate::{
    error::PeerError,
    outbox::Destination,
    session::{SessionState, SyncOrchestrator},
    spawn_requests::SpawnRetry,
};

impl<E: Copy + Eq + Hash> SyncOrchestrator<E> {
    pub(super) fn follow_host(&mut self, host: PeerId, now: Instant) {
        info!("SyncOrchestrator: following host {}", host);

        let was_host = self.state.is_host();
        let was_contested = self.contested.remove(&host);
        self.host = Some(host.clone());
        self.state = SessionState::ClientAwaitingSync;
        self.registry.set_authority(false);
        self.broadcast_timer = None;
        self.last_seen_timer = Some(Timer::new(self.config.last_seen_interval, now));
        self.last_received_snapshot = None;
        self.last_sent_snapshot = None;
        self.reported_snapshots.clear();
        self.sync_request_pending = false;
        self.events.push_host_change(&host);

        // our ids may have diverged while we believed we were host, and a
        // contested host's scene sync was dropped
        if was_host || was_contested {
            self.request_full_sync(now);
        }
    }

    pub(super) fn client_tick(&mut self, now: Instant) {
        let Some(host) = self.host.clone() else {
            return;
        };

        if self.state == SessionState::ClientActive {
            let report_due = self
                .last_seen_timer
                .as_mut()
                .map_or(false, |timer| timer.poll(now));
            if report_due {
                let snapshot_index = self.last_received_snapshot;
                self.send_unreliable(
                    Destination::Peer(host.clone()),
                    Payload::LastSeen(LastSeen { snapshot_index }),
                    now,
                );
            }
        }

        for retry in self.spawn_requests.due(now) {
            match retry {
                SpawnRetry::Resend(key, kind) => {
                    debug!("SyncOrchestrator: resending spawn request {:?}", key);
                    self.send_reliable(
                        Destination::Peer(host.clone()),
                        Payload::SpawnRequest(SpawnRequest { kind, key }),
                        now,
                    );
                }
                SpawnRetry::Expired(key) => {
                    warn!("SyncOrchestrator: spawn request {:?} expired", key);
                    self.events.push_error(PeerError::SpawnRequestExpired { key });
                }
            }
        }
    }

    pub(super) fn apply_scene_snapshot<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        index: MessageIndex,
        snapshot: SceneSnapshot,
    ) {
        if self.state != SessionState::ClientActive {
            return;
        }

        for delta in &snapshot.nodes {
            let handle = match self.registry.try_handle(&delta.id) {
                Ok(handle) => handle,
                Err(error) => {
                    debug!("SyncOrchestrator: skipping delta: {}", error);
                    continue;
                }
            };
            if !delta.apply(world, &handle) {
                debug!("SyncOrchestrator: node {} is gone locally", delta.id);
            }
        }
        self.last_received_snapshot = Some(index);
    }

    pub(super) fn apply_sync_nodes<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        sender: &PeerId,
        sync: SyncNodes,
        now: Instant,
    ) {
        let full_scene = sync.nodes.first().map(|node| node.kind) == Some(NodeKind::Scene)
            && sync.nodes.iter().all(|node| !node.spawn);
        let result = if full_scene {
            self.bind_scene(world, sender, &sync)
        } else {
            self.bind_spawn(world, sender, sync)
        };

        if let Err(error) = result {
            warn!(
                "SyncOrchestrator: could not bind nodes from {}: {}",
                sender, error
            );
            self.events.push_error(error.into());
            self.request_full_sync(now);
        }
    }

    /// Binds the host's scene ids to the local scene, position by position in
    /// breadth-first order.
    fn bind_scene<W: GameWorld<E>>(
        &mut self,
        world: &W,
        host: &PeerId,
        sync: &SyncNodes,
    ) -> Result<(), SyncError> {
        let root = world.scene_root().ok_or(SyncError::MissingScene)?;
        let local = self.scene_traversal(world, &root);
        if local.len() != sync.nodes.len() {
            return Err(SyncError::TraversalMismatch {
                local: local.len(),
                remote: sync.nodes.len(),
            });
        }
        for (handle, remote) in local.iter().zip(&sync.nodes) {
            let local_kind = world.node_kind(handle);
            if local_kind != Some(remote.kind) {
                return Err(SyncError::KindMismatch {
                    id: remote.id,
                    local: local_kind,
                    remote: remote.kind,
                });
            }
        }

        for (handle, remote) in local.into_iter().zip(&sync.nodes) {
            self.registry.bind(handle, host.clone(), remote.id);
        }
        self.registry.clear_snapshots();
        self.sync_request_pending = false;
        debug!("SyncOrchestrator: bound {} scene nodes", sync.nodes.len());

        if self.state == SessionState::ClientAwaitingSync {
            self.state = SessionState::ClientActive;
            self.events.push_scene_synced(host);
        }
        Ok(())
    }

    /// Instantiates a spawned object under its parent and binds its hierarchy
    /// to the ids the host minted.
    fn bind_spawn<W: GameWorld<E>>(
        &mut self,
        world: &mut W,
        sender: &PeerId,
        sync: SyncNodes,
    ) -> Result<(), SyncError> {
        let (parent, spawned) = match (sync.nodes.first(), sync.nodes.get(1)) {
            (Some(parent), Some(spawned)) if spawned.spawn => (*parent, *spawned),
            _ => return Err(SyncError::IncompleteNodeList),
        };
        if let Some(key) = &sync.spawn_key {
            self.spawn_requests.resolve(key);
        }

        if self.registry.contains(&spawned.id) {
            debug!("SyncOrchestrator: spawn {} is already bound", spawned.id);
            if let Some(key) = sync.spawn_key.clone() {
                self.spawn_ledger.insert(key, sync);
            }
            return Ok(());
        }

        let parent_handle = self
            .registry
            .handle(&parent.id)
            .filter(|handle| world.has_node(handle))
            .ok_or(SyncError::UnknownParent { id: parent.id })?;
        let node = world
            .instantiate(spawned.kind)
            .ok_or(SyncError::InstantiateFailed { kind: spawned.kind })?;
        world.attach(&node, &parent_handle);

        let local = breadth_first(world, &node);
        let remote = &sync.nodes[1..];
        if local.len() != remote.len() {
            world.despawn(&node);
            return Err(SyncError::TraversalMismatch {
                local: local.len(),
                remote: remote.len(),
            });
        }
        for (handle, expected) in local.iter().zip(remote) {
            let local_kind = world.node_kind(handle);
            if local_kind != Some(expected.kind) {
                world.despawn(&node);
                return Err(SyncError::KindMismatch {
                    id: expected.id,
                    local: local_kind,
                    remote: expected.kind,
                });
            }
        }

        let owner = sync.source_peer.clone().unwrap_or_else(|| sender.clone());
        for (handle, expected) in local.into_iter().zip(remote) {
            self.registry.bind(handle, owner.clone(), expected.id);
        }
        info!(
            "SyncOrchestrator: bound spawned {:?} {} owned by {}",
            spawned.kind, spawned.id, owner
        );

        if let Some(key) = sync.spawn_key.clone() {
            self.spawn_ledger.insert(key, sync);
        }
        self.events.push_spawn(Some(owner), spawned.id, node);
        Ok(())
    }

    pub(super) fn apply_despawn<W: GameWorld<E>>(&mut self, world: &mut W, despawn: DespawnNodes) {
        for id in &despawn.ids {
            let Some(node) = self.registry.unregister(id) else {
                debug!("SyncOrchestrator: despawn names unknown node {}", id);
                continue;
            };
            if world.has_node(&node.handle) {
                world.despawn(&node.handle);
            }
            self.events.push_despawn(*id, node.handle);
        }
        self.spawn_ledger.forget_roots(&despawn.ids);
        debug!("SyncOrchestrator: despawned {} nodes", despawn.ids.len());
    }
}
