//! Voting candidates and the peer register (spec.md §3 "Voting
//! candidates").

use std::time::SystemTime;

use crate::types::PeerId;

/// A registered peer currently eligible for voting, with the metrics
/// collected by the most recent successful poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub peer_id: PeerId,
    pub addr: String,
    pub remote_height: Option<u64>,
    pub local_height_at_query: Option<u64>,
    pub remote_digest_at_local_height: Option<[u8; 32]>,
    pub last_response_time: Option<SystemTime>,
}

impl Candidate {
    pub fn new(peer_id: PeerId, addr: String) -> Self {
        Self {
            peer_id,
            addr,
            remote_height: None,
            local_height_at_query: None,
            remote_digest_at_local_height: None,
            last_response_time: None,
        }
    }
}

/// The watching node's record of a registered peer (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterEntry {
    pub registered: bool,
    pub register_time: SystemTime,
}
