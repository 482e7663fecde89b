use thiserror::Error;

use dewdrop_serde::SerdeErr;

use super::MessageKind;

/// Errors that can occur while encoding or decoding an envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Envelope was written by an incompatible protocol revision
    #[error("Envelope protocol version {found} does not match local version {expected}")]
    VersionMismatch { expected: u8, found: u8 },

    /// Message kind tag is not known to this protocol revision
    #[error("Unknown message kind tag {tag}")]
    UnknownKind { tag: u8 },

    /// Unreliable envelopes must name their sender
    #[error("Unreliable {kind:?} envelope has no sender id")]
    MissingSender { kind: MessageKind },

    /// Payload was truncated or otherwise malformed
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] SerdeErr),
}
