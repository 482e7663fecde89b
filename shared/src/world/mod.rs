pub mod delta;
pub mod diff_config;
pub mod error;
pub mod game_world;
pub mod id_generator;
pub mod node_kind;
pub mod node_registry;
pub mod snapshot;
