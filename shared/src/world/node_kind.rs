use dewdrop_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// Archetype of a networked game object. Peers instantiate objects from the
/// kind alone, so every peer must be able to build the same hierarchy for a
/// given kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scene,
    Node,
    Player,
    Droplet,
    Gun,
}

impl NodeKind {
    fn to_tag(self) -> u8 {
        match self {
            NodeKind::Scene => 0,
            NodeKind::Node => 1,
            NodeKind::Player => 2,
            NodeKind::Droplet => 3,
            NodeKind::Gun => 4,
        }
    }

    /// Scenes are loaded by each peer, never spawned over the network.
    pub fn is_spawnable(&self) -> bool {
        !matches!(self, NodeKind::Scene)
    }
}

impl Serde for NodeKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.to_tag().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(NodeKind::Scene),
            1 => Ok(NodeKind::Node),
            2 => Ok(NodeKind::Player),
            3 => Ok(NodeKind::Droplet),
            4 => Ok(NodeKind::Gun),
            tag => Err(SerdeErr::InvalidTag {
                type_name: "NodeKind",
                tag: u64::from(tag),
            }),
        }
    }

    fn bit_length(&self) -> u32 {
        8
    }
}
