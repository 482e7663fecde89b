pub mod envelope;
pub mod error;
pub mod message_kind;
pub mod payloads;

pub use message_kind::MessageKind;
