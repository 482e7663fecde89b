
pub use helpers::*;
pub use local_network::{LocalNetwork, LocalTransport, Packet};
pub use test_world::{TestEntity, TestWorld};
