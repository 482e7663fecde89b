mod events;

pub use events::{
    DespawnEvent, ErrorEvent, Event, Events, HostChangedEvent, PeerConnectedEvent,
    PeerDisconnectedEvent, PlayerInputEvent, SceneSyncedEvent, SessionAbortedEvent, SpawnEvent,
};
