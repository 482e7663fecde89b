mod channel;

pub use channel::{TransportEvent, TransportHandle, TransportInbox};
