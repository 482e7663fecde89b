use std::{hash::Hash, mem, vec::IntoIter};

use dewdrop_shared::{NodeId, PeerId, PlayerInput};

use crate::error::{AbortReason, PeerError};

/// Everything the session observed since the last `take_events`.
pub struct Events<E: Copy + Eq + Hash> {
    spawns: Vec<(Option<PeerId>, NodeId, E)>,
    despawns: Vec<(NodeId, E)>,
    host_changes: Vec<PeerId>,
    scene_syncs: Vec<PeerId>,
    player_inputs: Vec<(PeerId, PlayerInput)>,
    connections: Vec<PeerId>,
    disconnections: Vec<PeerId>,
    errors: Vec<PeerError>,
    aborts: Vec<AbortReason>,
    empty: bool,
}

impl<E: Copy + Eq + Hash> Default for Events<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + Eq + Hash> Events<E> {
    pub(crate) fn new() -> Self {
        Self {
            spawns: Vec::new(),
            despawns: Vec::new(),
            host_changes: Vec::new(),
            scene_syncs: Vec::new(),
            player_inputs: Vec::new(),
            connections: Vec::new(),
            disconnections: Vec::new(),
            errors: Vec::new(),
            aborts: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event<E>>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event<E>>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_spawn(&mut self, requester: Option<PeerId>, id: NodeId, handle: E) {
        self.spawns.push((requester, id, handle));
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, id: NodeId, handle: E) {
        self.despawns.push((id, handle));
        self.empty = false;
    }

    pub(crate) fn push_host_change(&mut self, host: &PeerId) {
        self.host_changes.push(host.clone());
        self.empty = false;
    }

    pub(crate) fn push_scene_synced(&mut self, host: &PeerId) {
        self.scene_syncs.push(host.clone());
        self.empty = false;
    }

    pub(crate) fn push_player_input(&mut self, peer: &PeerId, input: PlayerInput) {
        self.player_inputs.push((peer.clone(), input));
        self.empty = false;
    }

    pub(crate) fn push_connection(&mut self, peer: &PeerId) {
        self.connections.push(peer.clone());
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, peer: &PeerId) {
        self.disconnections.push(peer.clone());
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: PeerError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn push_abort(&mut self, reason: AbortReason) {
        self.aborts.push(reason);
        self.empty = false;
    }
}

// Event Trait
pub trait Event<E: Copy + Eq + Hash> {
    type Iter;

    fn iter(events: &mut Events<E>) -> Self::Iter;

    fn has(events: &Events<E>) -> bool;
}

/// A networked object was spawned: `(requester, root id, handle)`
pub struct SpawnEvent;
impl<E: Copy + Eq + Hash> Event<E> for SpawnEvent {
    type Iter = IntoIter<(Option<PeerId>, NodeId, E)>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.spawns);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.spawns.is_empty()
    }
}

/// A networked object was removed: `(id, handle)`
pub struct DespawnEvent;
impl<E: Copy + Eq + Hash> Event<E> for DespawnEvent {
    type Iter = IntoIter<(NodeId, E)>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.despawns);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.despawns.is_empty()
    }
}

pub struct HostChangedEvent;
impl<E: Copy + Eq + Hash> Event<E> for HostChangedEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.host_changes);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.host_changes.is_empty()
    }
}

/// The local scene was bound to the host's ids
pub struct SceneSyncedEvent;
impl<E: Copy + Eq + Hash> Event<E> for SceneSyncedEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.scene_syncs);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.scene_syncs.is_empty()
    }
}

pub struct PlayerInputEvent;
impl<E: Copy + Eq + Hash> Event<E> for PlayerInputEvent {
    type Iter = IntoIter<(PeerId, PlayerInput)>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.player_inputs);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.player_inputs.is_empty()
    }
}

pub struct PeerConnectedEvent;
impl<E: Copy + Eq + Hash> Event<E> for PeerConnectedEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.connections.is_empty()
    }
}

pub struct PeerDisconnectedEvent;
impl<E: Copy + Eq + Hash> Event<E> for PeerDisconnectedEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.disconnections.is_empty()
    }
}

pub struct ErrorEvent;
impl<E: Copy + Eq + Hash> Event<E> for ErrorEvent {
    type Iter = IntoIter<PeerError>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.errors.is_empty()
    }
}

pub struct SessionAbortedEvent;
impl<E: Copy + Eq + Hash> Event<E> for SessionAbortedEvent {
    type Iter = IntoIter<AbortReason>;

    fn iter(events: &mut Events<E>) -> Self::Iter {
        let list = mem::take(&mut events.aborts);
        list.into_iter()
    }

    fn has(events: &Events<E>) -> bool {
        !events.aborts.is_empty()
    }
}
