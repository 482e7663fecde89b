use std::{
    collections::{BTreeSet, HashMap},
    hash::Hash,
};

use log::{error, info, warn};

use crate::{
    types::{NodeId, PeerId},
    world::{error::RegistryError, id_generator::IdGenerator, snapshot::StateSnapshot},
};

/// A game object known to every peer under the same id.
#[derive(Clone, Debug)]
pub struct NetworkedNode<E: Copy + Eq + Hash> {
    pub id: NodeId,
    pub owner: PeerId,
    pub handle: E,
    /// State last broadcast (host) or last applied (client)
    pub last_snapshot: Option<StateSnapshot>,
}

/// Bidirectional id <-> handle map. Only a peer with authority mints ids;
/// every peer binds ids it receives from the host.
pub struct NodeRegistry<E: Copy + Eq + Hash> {
    is_authority: bool,
    generator: IdGenerator,
    nodes: HashMap<NodeId, NetworkedNode<E>>,
    handle_to_id: HashMap<E, NodeId>,
    order: BTreeSet<NodeId>,
}

impl<E: Copy + Eq + Hash> NodeRegistry<E> {
    pub fn new() -> Self {
        Self {
            is_authority: false,
            generator: IdGenerator::new(),
            nodes: HashMap::new(),
            handle_to_id: HashMap::new(),
            order: BTreeSet::new(),
        }
    }

    pub fn is_authority(&self) -> bool {
        self.is_authority
    }

    pub fn set_authority(&mut self, is_authority: bool) {
        self.is_authority = is_authority;
    }

    /// Mints a new id for `handle`. Re-registering a known handle returns its
    /// existing id.
    pub fn register(&mut self, handle: E, owner: PeerId) -> Result<NodeId, RegistryError> {
        if !self.is_authority {
            error!("NodeRegistry: register() called without host authority");
            return Err(RegistryError::NotAuthority);
        }

        if let Some(id) = self.handle_to_id.get(&handle) {
            return Ok(*id);
        }

        let id = self.generator.generate()?;
        self.insert(NetworkedNode {
            id,
            owner,
            handle,
            last_snapshot: None,
        });
        Ok(id)
    }

    /// Records an id assigned by the host. Any previous binding of either the
    /// handle or the id is replaced.
    pub fn bind(&mut self, handle: E, owner: PeerId, id: NodeId) {
        if let Some(previous_id) = self.handle_to_id.get(&handle).copied() {
            if previous_id != id {
                warn!(
                    "NodeRegistry: rebinding handle from {} to {}",
                    previous_id, id
                );
                self.unregister(&previous_id);
            }
        }
        if let Some(previous) = self.nodes.get(&id) {
            if previous.handle != handle {
                self.handle_to_id.remove(&previous.handle);
            }
        }

        self.generator.raise_floor(id);
        self.insert(NetworkedNode {
            id,
            owner,
            handle,
            last_snapshot: None,
        });
    }

    fn insert(&mut self, node: NetworkedNode<E>) {
        self.handle_to_id.insert(node.handle, node.id);
        self.order.insert(node.id);
        self.nodes.insert(node.id, node);
    }

    pub fn unregister(&mut self, id: &NodeId) -> Option<NetworkedNode<E>> {
        let node = self.nodes.remove(id)?;
        self.order.remove(id);
        if self.handle_to_id.get(&node.handle) == Some(id) {
            self.handle_to_id.remove(&node.handle);
        }
        Some(node)
    }

    pub fn handle(&self, id: &NodeId) -> Option<E> {
        self.nodes.get(id).map(|node| node.handle)
    }

    /// Like [`handle`](NodeRegistry::handle), for callers that report the
    /// miss.
    pub fn try_handle(&self, id: &NodeId) -> Result<E, RegistryError> {
        self.handle(id).ok_or(RegistryError::UnknownNode { id: *id })
    }

    pub fn node_id(&self, handle: &E) -> Option<NodeId> {
        self.handle_to_id.get(handle).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&NetworkedNode<E>> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut NetworkedNode<E>> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.order.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkedNode<E>> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// How far the id space has advanced. Peers compare it to rank host
    /// claims.
    pub fn id_floor(&self) -> u32 {
        self.generator.floor()
    }

    /// Id the next `register` call would mint.
    pub fn next_id(&self) -> Option<NodeId> {
        self.generator.peek()
    }

    /// Hands every node owned by `from` to `to`. Returns how many moved.
    pub fn transfer_ownership(&mut self, from: &PeerId, to: &PeerId) -> usize {
        let mut moved = 0;
        for node in self.nodes.values_mut() {
            if &node.owner == from {
                node.owner = to.clone();
                moved += 1;
            }
        }
        if moved > 0 {
            info!(
                "NodeRegistry: transferred {} nodes from {} to {}",
                moved, from, to
            );
        }
        moved
    }

    /// Forgets every last snapshot so the next diff of each node is full.
    pub fn clear_snapshots(&mut self) {
        for node in self.nodes.values_mut() {
            node.last_snapshot = None;
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.handle_to_id.clear();
        self.order.clear();
        self.generator.reset();
        self.is_authority = false;
    }
}

impl<E: Copy + Eq + Hash> Default for NodeRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
