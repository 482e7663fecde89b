use std::cmp::Ordering;

use crate::{messages::payloads::HostClaim, PeerId};

/// Picks the session authority.
///
/// A transport hint wins when it names a member of `peers`. Otherwise the
/// lowest identifier is elected, which every peer computes identically
/// from the same peer set without exchanging any message.
pub fn elect_host(peers: &[PeerId], transport_hint: Option<&PeerId>) -> Option<PeerId> {
    if let Some(hint) = transport_hint {
        if peers.contains(hint) {
            return Some(hint.clone());
        }
    }

    peers.iter().min().cloned()
}

/// Decides a conflicting host claim against the host `holder` currently
/// recognised, whose registry stands at `holder_floor`. Returns `true` when
/// `claimant` should take over.
///
/// The further advanced id space wins, so a peer joining a running session
/// never displaces the host that minted the ids already in play. Equal
/// floors fall back to the lowest identifier, as in [`elect_host`].
pub fn outranks(claimant: &PeerId, claim: &HostClaim, holder: &PeerId, holder_floor: u32) -> bool {
    match claim.id_floor.cmp(&holder_floor) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => claimant < holder,
    }
}
