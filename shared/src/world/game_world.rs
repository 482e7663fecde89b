use std::{
    collections::{HashSet, VecDeque},
    hash::Hash,
};

use crate::{types::Vec2, world::node_kind::NodeKind};

/// Physics body subset that is replicated.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PhysicsState {
    pub angular_damping: f32,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub mass: f32,
    pub velocity: Vec2,
}

/// The game engine, as seen by the sync layer. `E` is an arena key owned by
/// the engine; it may outlive the object it refers to, in which case
/// [`has_node`](GameWorld::has_node) returns `false` and getters return
/// `None`.
pub trait GameWorld<E: Copy + Eq + Hash> {
    fn scene_root(&self) -> Option<E>;

    fn has_node(&self, node: &E) -> bool;

    fn node_kind(&self, node: &E) -> Option<NodeKind>;

    /// Builds a new object of `kind`, including any children the kind
    /// always carries. The object is not attached to anything yet.
    fn instantiate(&mut self, kind: NodeKind) -> Option<E>;

    fn despawn(&mut self, node: &E);

    /// Direct children in a stable order.
    fn children(&self, node: &E) -> Vec<E>;

    fn attach(&mut self, node: &E, parent: &E);

    fn position(&self, node: &E) -> Option<Vec2>;
    fn set_position(&mut self, node: &E, position: Vec2);

    fn depth(&self, node: &E) -> Option<f32>;
    fn set_depth(&mut self, node: &E, depth: f32);

    fn rotation(&self, node: &E) -> Option<f32>;
    fn set_rotation(&mut self, node: &E, rotation: f32);

    fn physics(&self, node: &E) -> Option<PhysicsState>;
    fn set_physics(&mut self, node: &E, physics: PhysicsState);
}

/// Breadth-first walk of `root` and all its descendants, `root` first.
pub fn breadth_first<E: Copy + Eq + Hash, W: GameWorld<E> + ?Sized>(world: &W, root: &E) -> Vec<E> {
    breadth_first_excluding(world, root, &HashSet::new())
}

/// Like [`breadth_first`], but skips every node in `excluded` together with
/// its subtree. `root` itself is always visited.
pub fn breadth_first_excluding<E: Copy + Eq + Hash, W: GameWorld<E> + ?Sized>(
    world: &W,
    root: &E,
    excluded: &HashSet<E>,
) -> Vec<E> {
    let mut output = Vec::new();
    if !world.has_node(root) {
        return output;
    }

    let mut queue = VecDeque::new();
    queue.push_back(*root);
    while let Some(node) = queue.pop_front() {
        output.push(node);
        queue.extend(
            world
                .children(&node)
                .into_iter()
                .filter(|child| !excluded.contains(child)),
        );
    }
    output
}
