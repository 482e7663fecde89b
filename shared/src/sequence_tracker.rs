use std::collections::HashMap;

use log::trace;

use crate::{messages::MessageKind, types::MessageIndex, PeerId};

#[derive(Clone, Copy, Default)]
struct SendCounter {
    next: MessageIndex,
    started: bool,
}

/// Last accepted sequencing state for one (peer, kind) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceState {
    pub last_index: MessageIndex,
    pub wrapped: bool,
}

/// Hands out outgoing indices per message kind, and gates incoming messages
/// so that stale or duplicated deliveries are dropped.
///
/// Ordering is decided by the sender-supplied `wrapped` flag rather than by
/// index magnitude alone, so a counter that rolls over from `u16::MAX` to `0`
/// keeps being accepted.
#[derive(Default)]
pub struct SequenceTracker {
    send_counters: HashMap<MessageKind, SendCounter>,
    received: HashMap<(PeerId, MessageKind), SequenceState>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index to stamp on the next outgoing message of `kind`,
    /// and whether the counter has just rolled over.
    pub fn next_send_index(&mut self, kind: MessageKind) -> (MessageIndex, bool) {
        let counter = self.send_counters.entry(kind).or_default();
        let index = counter.next;
        let wrapped = counter.started && index == 0;
        counter.started = true;
        counter.next = counter.next.wrapping_add(1);
        (index, wrapped)
    }

    pub fn should_accept(
        &mut self,
        sender: &PeerId,
        kind: MessageKind,
        index: MessageIndex,
        wrapped: bool,
    ) -> bool {
        let key = (sender.clone(), kind);
        let accept = match self.received.get(&key) {
            None => true,
            Some(state) => wrapped || index > state.last_index,
        };

        if accept {
            self.received.insert(
                key,
                SequenceState {
                    last_index: index,
                    wrapped,
                },
            );
        } else {
            trace!(
                "SequenceTracker: dropping stale {:?} #{} from {}",
                kind,
                index,
                sender
            );
        }

        accept
    }

    pub fn state(&self, sender: &PeerId, kind: MessageKind) -> Option<SequenceState> {
        self.received.get(&(sender.clone(), kind)).copied()
    }

    pub fn forget_peer(&mut self, peer: &PeerId) {
        self.received.retain(|(sender, _), _| sender != peer);
    }

    pub fn clear(&mut self) {
        self.send_counters.clear();
        self.received.clear();
    }

    /// Wrapping distance from `last_seen` forward to `current`.
    pub fn index_lag(last_seen: MessageIndex, current: MessageIndex) -> u16 {
        current.wrapping_sub(last_seen)
    }
}
