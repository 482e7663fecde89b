use dewdrop_serde::{BitReader, BitWriter, Serde};

use crate::{
    messages::{error::EnvelopeError, payloads::Payload, MessageKind},
    transport::Reliability,
    types::{MessageIndex, PeerId},
};

/// Bumped whenever the envelope layout or a payload layout changes.
pub const PROTOCOL_VERSION: u8 = 2;

/// Sequencing data stamped on every envelope. `sender` is only carried on the
/// wire for unreliable kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceMetadata {
    pub index: MessageIndex,
    pub wrapped: bool,
    pub sender: Option<PeerId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub metadata: SequenceMetadata,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(payload: Payload, index: MessageIndex, wrapped: bool, sender: &PeerId) -> Self {
        Self {
            metadata: SequenceMetadata {
                index,
                wrapped,
                sender: Some(sender.clone()),
            },
            payload,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        let kind = self.kind();
        let mut writer = BitWriter::new();

        PROTOCOL_VERSION.ser(&mut writer);
        kind.to_tag().ser(&mut writer);
        self.metadata.index.ser(&mut writer);
        self.metadata.wrapped.ser(&mut writer);
        if kind.reliability() == Reliability::Unreliable {
            let Some(sender) = &self.metadata.sender else {
                return Err(EnvelopeError::MissingSender { kind });
            };
            sender.ser(&mut writer);
        }
        self.payload.ser(&mut writer);

        Ok(writer.to_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let mut reader = BitReader::new(bytes);

        let version = u8::de(&mut reader)?;
        if version != PROTOCOL_VERSION {
            return Err(EnvelopeError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: version,
            });
        }

        let tag = u8::de(&mut reader)?;
        let kind = MessageKind::from_tag(tag).ok_or(EnvelopeError::UnknownKind { tag })?;
        let index = MessageIndex::de(&mut reader)?;
        let wrapped = bool::de(&mut reader)?;
        let sender = match kind.reliability() {
            Reliability::Unreliable => Some(PeerId::de(&mut reader)?),
            Reliability::Reliable => None,
        };
        let payload = Payload::de(kind, &mut reader)?;

        Ok(Self {
            metadata: SequenceMetadata {
                index,
                wrapped,
                sender,
            },
            payload,
        })
    }
}
