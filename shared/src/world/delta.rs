use std::hash::Hash;

use dewdrop_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    types::{NodeId, Vec2},
    world::{
        diff_config::DiffConfig,
        game_world::{GameWorld, PhysicsState},
        snapshot::StateSnapshot,
    },
};

/// Changed physics fields. `None` means unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PhysicsDelta {
    pub angular_damping: Option<f32>,
    pub angular_velocity: Option<f32>,
    pub linear_damping: Option<f32>,
    pub mass: Option<f32>,
    pub velocity: Option<Vec2>,
}

impl PhysicsDelta {
    fn full(state: &PhysicsState) -> Self {
        Self {
            angular_damping: Some(state.angular_damping),
            angular_velocity: Some(state.angular_velocity),
            linear_damping: Some(state.linear_damping),
            mass: Some(state.mass),
            velocity: Some(state.velocity),
        }
    }

    fn between(previous: &PhysicsState, current: &PhysicsState, tolerance: f32) -> Self {
        Self {
            angular_damping: scalar_change(
                previous.angular_damping,
                current.angular_damping,
                tolerance,
            ),
            angular_velocity: scalar_change(
                previous.angular_velocity,
                current.angular_velocity,
                tolerance,
            ),
            linear_damping: scalar_change(
                previous.linear_damping,
                current.linear_damping,
                tolerance,
            ),
            mass: scalar_change(previous.mass, current.mass, tolerance),
            velocity: vector_change(&previous.velocity, &current.velocity, tolerance),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.angular_damping.is_none()
            && self.angular_velocity.is_none()
            && self.linear_damping.is_none()
            && self.mass.is_none()
            && self.velocity.is_none()
    }

    fn merge_into(&self, state: &mut PhysicsState) {
        if let Some(value) = self.angular_damping {
            state.angular_damping = value;
        }
        if let Some(value) = self.angular_velocity {
            state.angular_velocity = value;
        }
        if let Some(value) = self.linear_damping {
            state.linear_damping = value;
        }
        if let Some(value) = self.mass {
            state.mass = value;
        }
        if let Some(value) = self.velocity {
            state.velocity = value;
        }
    }
}

/// Sparse update for one node: only the fields that are `Some` are touched
/// when the delta is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeDelta {
    pub id: NodeId,
    pub position: Option<Vec2>,
    pub depth: Option<f32>,
    pub rotation: Option<f32>,
    pub physics: Option<PhysicsDelta>,
}

impl NodeDelta {
    pub fn empty(id: NodeId) -> Self {
        Self {
            id,
            position: None,
            depth: None,
            rotation: None,
            physics: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.depth.is_none()
            && self.rotation.is_none()
            && self.physics.map_or(true, |physics| physics.is_empty())
    }

    /// Computes the fields of `current` that moved past the configured
    /// tolerance since `previous`. Without a previous snapshot every field is
    /// included.
    pub fn diff(
        id: NodeId,
        previous: Option<&StateSnapshot>,
        current: &StateSnapshot,
        config: &DiffConfig,
    ) -> Self {
        let Some(previous) = previous else {
            return Self {
                id,
                position: Some(current.position),
                depth: Some(current.depth),
                rotation: Some(current.rotation),
                physics: current.physics.as_ref().map(PhysicsDelta::full),
            };
        };

        let tolerance = config.tolerance;
        let rotation = if config.rotation.distance(previous.rotation, current.rotation) > tolerance
        {
            Some(current.rotation)
        } else {
            None
        };

        let physics = match (&previous.physics, &current.physics) {
            (_, None) => None,
            (None, Some(current)) => Some(PhysicsDelta::full(current)),
            (Some(previous), Some(current)) => {
                let delta = PhysicsDelta::between(previous, current, tolerance);
                if delta.is_empty() {
                    None
                } else {
                    Some(delta)
                }
            }
        };

        Self {
            id,
            position: vector_change(&previous.position, &current.position, tolerance),
            depth: scalar_change(previous.depth, current.depth, tolerance),
            rotation,
            physics,
        }
    }

    /// Writes the present fields onto `handle`. Returns `false` if the handle
    /// no longer refers to a live object.
    pub fn apply<E: Copy + Eq + Hash, W: GameWorld<E> + ?Sized>(
        &self,
        world: &mut W,
        handle: &E,
    ) -> bool {
        if !world.has_node(handle) {
            return false;
        }

        if let Some(position) = self.position {
            world.set_position(handle, position);
        }
        if let Some(depth) = self.depth {
            world.set_depth(handle, depth);
        }
        if let Some(rotation) = self.rotation {
            world.set_rotation(handle, rotation);
        }
        if let Some(physics_delta) = &self.physics {
            if let Some(mut physics) = world.physics(handle) {
                physics_delta.merge_into(&mut physics);
                world.set_physics(handle, physics);
            }
        }

        true
    }

    /// Folds this delta into a known snapshot, as if it had been applied.
    pub fn apply_to_snapshot(&self, snapshot: &mut StateSnapshot) {
        if let Some(position) = self.position {
            snapshot.position = position;
        }
        if let Some(depth) = self.depth {
            snapshot.depth = depth;
        }
        if let Some(rotation) = self.rotation {
            snapshot.rotation = rotation;
        }
        if let (Some(physics_delta), Some(physics)) = (&self.physics, &mut snapshot.physics) {
            physics_delta.merge_into(physics);
        }
    }
}

fn scalar_change(previous: f32, current: f32, tolerance: f32) -> Option<f32> {
    if (current - previous).abs() > tolerance {
        Some(current)
    } else {
        None
    }
}

fn vector_change(previous: &Vec2, current: &Vec2, tolerance: f32) -> Option<Vec2> {
    if previous.distance(current) > tolerance {
        Some(*current)
    } else {
        None
    }
}

impl Serde for PhysicsDelta {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.angular_damping.ser(writer);
        self.angular_velocity.ser(writer);
        self.linear_damping.ser(writer);
        self.mass.ser(writer);
        self.velocity.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            angular_damping: Option::<f32>::de(reader)?,
            angular_velocity: Option::<f32>::de(reader)?,
            linear_damping: Option::<f32>::de(reader)?,
            mass: Option::<f32>::de(reader)?,
            velocity: Option::<Vec2>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.angular_damping.bit_length()
            + self.angular_velocity.bit_length()
            + self.linear_damping.bit_length()
            + self.mass.bit_length()
            + self.velocity.bit_length()
    }
}

impl Serde for NodeDelta {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.id.ser(writer);
        self.position.ser(writer);
        self.depth.ser(writer);
        self.rotation.ser(writer);
        self.physics.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: NodeId::de(reader)?,
            position: Option::<Vec2>::de(reader)?,
            depth: Option::<f32>::de(reader)?,
            rotation: Option::<f32>::de(reader)?,
            physics: Option::<PhysicsDelta>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.id.bit_length()
            + self.position.bit_length()
            + self.depth.bit_length()
            + self.rotation.bit_length()
            + self.physics.bit_length()
    }
}
