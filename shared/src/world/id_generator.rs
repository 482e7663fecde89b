use crate::{types::NodeId, world::error::RegistryError};

/// Sequential node id source. Ids are never recycled within a session, and
/// the floor can be raised so that ids learned from a previous host are
/// never minted again.
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn generate(&mut self) -> Result<NodeId, RegistryError> {
        let value = u16::try_from(self.next).map_err(|_| RegistryError::IdsExhausted {
            last: Some(NodeId::new(u16::MAX)),
        })?;
        self.next += 1;
        Ok(NodeId::new(value))
    }

    /// Makes sure the next generated id is greater than `id`.
    pub fn raise_floor(&mut self, id: NodeId) {
        self.next = self.next.max(u32::from(id.value()) + 1);
    }

    /// Value the next id will take, past `u16::MAX` once exhausted.
    pub fn floor(&self) -> u32 {
        self.next
    }

    pub fn peek(&self) -> Option<NodeId> {
        u16::try_from(self.next).ok().map(NodeId::new)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
