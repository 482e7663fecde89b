use std::hash::Hash;

use crate::{
    types::Vec2,
    world::game_world::{GameWorld, PhysicsState},
};

/// Every replicated field of one node, captured at a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StateSnapshot {
    pub position: Vec2,
    pub depth: f32,
    pub rotation: f32,
    pub physics: Option<PhysicsState>,
}

impl StateSnapshot {
    /// Reads the tracked fields of `handle`, or `None` if the object is gone.
    pub fn capture<E: Copy + Eq + Hash, W: GameWorld<E> + ?Sized>(
        world: &W,
        handle: &E,
    ) -> Option<Self> {
        if !world.has_node(handle) {
            return None;
        }

        Some(Self {
            position: world.position(handle)?,
            depth: world.depth(handle)?,
            rotation: world.rotation(handle)?,
            physics: world.physics(handle),
        })
    }
}
